use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::progression::resolve_pending;
use crate::types::{
  BracketError, BracketFormat, BracketSide, BracketStatus, Match, MatchStatus, Player,
  TournamentBracket,
};

/// Generate a bracket with the thread RNG deciding the shuffle.
pub fn generate(
  format: BracketFormat,
  players: &[Player],
  tournament_id: &str,
) -> Result<TournamentBracket, BracketError> {
  generate_with(format, players, tournament_id, &mut rand::thread_rng())
}

/// Generate a reproducible bracket: the same seed and roster always
/// produce the same shuffle and therefore the same match graph.
pub fn generate_seeded(
  format: BracketFormat,
  players: &[Player],
  tournament_id: &str,
  seed: u64,
) -> Result<TournamentBracket, BracketError> {
  let mut rng = ChaCha8Rng::seed_from_u64(seed);
  generate_with(format, players, tournament_id, &mut rng)
}

pub fn generate_with<R: Rng>(
  format: BracketFormat,
  players: &[Player],
  tournament_id: &str,
  rng: &mut R,
) -> Result<TournamentBracket, BracketError> {
  if players.len() < 2 {
    return Err(BracketError::NotEnoughPlayers { count: players.len() });
  }
  let mut shuffled = players.to_vec();
  shuffled.shuffle(rng);

  let mut bracket = match format {
    BracketFormat::SingleElimination => build_single_elimination(shuffled, tournament_id),
    BracketFormat::DoubleElimination => build_double_elimination(shuffled, tournament_id),
    BracketFormat::RoundRobin => build_round_robin(shuffled, tournament_id),
  };
  resolve_pending(&mut bracket);

  info!(
    tournament = %bracket.id,
    format = ?bracket.format,
    players = bracket.players.len(),
    matches = bracket.matches.len(),
    rounds = bracket.total_rounds,
    "bracket generated"
  );
  Ok(bracket)
}

// ── Single elimination ─────────────────────────────────────────────────

fn build_single_elimination(shuffled: Vec<Player>, tournament_id: &str) -> TournamentBracket {
  let bracket_size = shuffled.len().next_power_of_two();
  let total_rounds = bracket_size.trailing_zeros();
  let mut matches = Vec::new();
  let mut next_id = 1u32;

  let mut previous_ids =
    build_first_round(&mut matches, &shuffled, tournament_id, &mut next_id, "match", 1);
  for round in 2..=total_rounds {
    previous_ids = build_pairing_round(
      &mut matches,
      tournament_id,
      &mut next_id,
      "match",
      round,
      BracketSide::Winners,
      &previous_ids,
    );
  }

  TournamentBracket {
    id: tournament_id.to_string(),
    name: BracketFormat::SingleElimination.display_name().to_string(),
    format: BracketFormat::SingleElimination,
    players: shuffled,
    matches,
    current_round: 1,
    total_rounds,
    status: BracketStatus::Setup,
    winner: None,
  }
}

// ── Round robin ────────────────────────────────────────────────────────

fn build_round_robin(shuffled: Vec<Player>, tournament_id: &str) -> TournamentBracket {
  let mut matches = Vec::new();
  let mut next_id = 1u32;
  let mut position = 0u32;

  // Every unordered pair exactly once; one logical round for the lot.
  for i in 0..shuffled.len() {
    for j in (i + 1)..shuffled.len() {
      push_match(
        &mut matches,
        tournament_id,
        &mut next_id,
        "match",
        1,
        position,
        BracketSide::Winners,
        Some(shuffled[i].clone()),
        Some(shuffled[j].clone()),
        None,
        None,
      );
      position += 1;
    }
  }

  TournamentBracket {
    id: tournament_id.to_string(),
    name: BracketFormat::RoundRobin.display_name().to_string(),
    format: BracketFormat::RoundRobin,
    players: shuffled,
    matches,
    current_round: 1,
    total_rounds: 1,
    status: BracketStatus::Setup,
    winner: None,
  }
}

// ── Double elimination ─────────────────────────────────────────────────

fn build_double_elimination(shuffled: Vec<Player>, tournament_id: &str) -> TournamentBracket {
  let bracket_size = shuffled.len().next_power_of_two();
  let winners_rounds = bracket_size.trailing_zeros();
  let losers_rounds = (winners_rounds - 1) * 2;
  let total_rounds = winners_rounds + losers_rounds + 1;
  let mut matches = Vec::new();
  let mut next_id = 1u32;

  // Winners bracket, built exactly like single elimination.
  let mut previous_ids = build_first_round(
    &mut matches,
    &shuffled,
    tournament_id,
    &mut next_id,
    "w-match",
    1,
  );
  for round in 2..=winners_rounds {
    previous_ids = build_pairing_round(
      &mut matches,
      tournament_id,
      &mut next_id,
      "w-match",
      round,
      BracketSide::Winners,
      &previous_ids,
    );
  }
  let winners_final_id = previous_ids[0].clone();

  // Losers bracket in minor/major pairs. Minor rounds (after the first) are
  // link-fed by the preceding major round; major rounds take the preceding
  // minor round's winner in slot 1 and leave slot 2 open for a routed loser.
  // The first losers round is fully open.
  let mut previous_major_ids: Vec<String> = Vec::new();
  for k in 1..winners_rounds {
    let round_size = bracket_size >> (k + 1);
    let minor_round = winners_rounds + 2 * k - 1;
    let major_round = winners_rounds + 2 * k;

    let minor_ids = if k == 1 {
      let mut ids = Vec::with_capacity(round_size);
      for position in 0..round_size {
        let id = push_match(
          &mut matches,
          tournament_id,
          &mut next_id,
          "l-match",
          minor_round,
          position as u32,
          BracketSide::Losers,
          None,
          None,
          None,
          None,
        );
        ids.push(id);
      }
      ids
    } else {
      build_pairing_round(
        &mut matches,
        tournament_id,
        &mut next_id,
        "l-match",
        minor_round,
        BracketSide::Losers,
        &previous_major_ids,
      )
    };

    let mut major_ids = Vec::with_capacity(round_size);
    for (position, minor_id) in minor_ids.iter().enumerate() {
      let id = push_match(
        &mut matches,
        tournament_id,
        &mut next_id,
        "l-match",
        major_round,
        position as u32,
        BracketSide::Losers,
        None,
        None,
        Some(minor_id.clone()),
        None,
      );
      link_next(&mut matches, minor_id, &id);
      major_ids.push(id);
    }
    previous_major_ids = major_ids;
  }

  // Losers final: the losers bracket champion against the winners-bracket
  // runner-up (routed in, like every other loser).
  let losers_final_prev = previous_major_ids.last().cloned();
  let losers_final_id = push_match(
    &mut matches,
    tournament_id,
    &mut next_id,
    "losers-final",
    total_rounds - 1,
    0,
    BracketSide::LosersFinal,
    None,
    None,
    losers_final_prev.clone(),
    None,
  );
  if let Some(prev) = &losers_final_prev {
    link_next(&mut matches, prev, &losers_final_id);
  }

  // Grand final: winners champion vs losers champion.
  let grand_final_id = push_match(
    &mut matches,
    tournament_id,
    &mut next_id,
    "grand-final",
    total_rounds,
    0,
    BracketSide::GrandFinal,
    None,
    None,
    Some(winners_final_id.clone()),
    Some(losers_final_id.clone()),
  );
  link_next(&mut matches, &winners_final_id, &grand_final_id);
  link_next(&mut matches, &losers_final_id, &grand_final_id);

  TournamentBracket {
    id: tournament_id.to_string(),
    name: BracketFormat::DoubleElimination.display_name().to_string(),
    format: BracketFormat::DoubleElimination,
    players: shuffled,
    matches,
    current_round: 1,
    total_rounds,
    status: BracketStatus::Setup,
    winner: None,
  }
}

// ── Construction helpers ───────────────────────────────────────────────

/// First elimination round: pair the shuffled roster two by two across
/// `bracket_size / 2` matches. A match left with a single player is a bye
/// and resolves on the spot; a match left with none can never be played.
fn build_first_round(
  matches: &mut Vec<Match>,
  shuffled: &[Player],
  tournament_id: &str,
  next_id: &mut u32,
  tag: &str,
  round: u32,
) -> Vec<String> {
  let bracket_size = shuffled.len().next_power_of_two();
  let mut ids = Vec::with_capacity(bracket_size / 2);
  for i in 0..bracket_size / 2 {
    let player1 = shuffled.get(2 * i).cloned();
    let player2 = shuffled.get(2 * i + 1).cloned();
    let id = push_match(
      matches,
      tournament_id,
      next_id,
      tag,
      round,
      i as u32,
      BracketSide::Winners,
      player1,
      player2,
      None,
      None,
    );
    if let Some(slot) = matches.last_mut() {
      match (&slot.player1, &slot.player2) {
        (Some(p1), None) => {
          slot.winner = Some(p1.clone());
          slot.status = MatchStatus::Completed;
        }
        (None, None) => {
          slot.status = MatchStatus::Skipped;
        }
        _ => {}
      }
    }
    ids.push(id);
  }
  ids
}

/// Pair the previous round's matches two by two, wiring predecessor links
/// on the new match and the next-match link on both feeders.
fn build_pairing_round(
  matches: &mut Vec<Match>,
  tournament_id: &str,
  next_id: &mut u32,
  tag: &str,
  round: u32,
  side: BracketSide,
  previous_ids: &[String],
) -> Vec<String> {
  let mut ids = Vec::with_capacity(previous_ids.len() / 2);
  for (position, pair) in previous_ids.chunks(2).enumerate() {
    let id = push_match(
      matches,
      tournament_id,
      next_id,
      tag,
      round,
      position as u32,
      side,
      None,
      None,
      Some(pair[0].clone()),
      Some(pair[1].clone()),
    );
    link_next(matches, &pair[0], &id);
    link_next(matches, &pair[1], &id);
    ids.push(id);
  }
  ids
}

#[allow(clippy::too_many_arguments)]
fn push_match(
  matches: &mut Vec<Match>,
  tournament_id: &str,
  next_id: &mut u32,
  tag: &str,
  round: u32,
  position: u32,
  side: BracketSide,
  player1: Option<Player>,
  player2: Option<Player>,
  previous_match1_id: Option<String>,
  previous_match2_id: Option<String>,
) -> String {
  let id = format!("{tournament_id}-{tag}-{next_id}");
  *next_id += 1;
  matches.push(Match {
    id: id.clone(),
    tournament_id: tournament_id.to_string(),
    round,
    position,
    side,
    player1,
    player2,
    winner: None,
    score: None,
    status: MatchStatus::Pending,
    next_match_id: None,
    previous_match1_id,
    previous_match2_id,
  });
  id
}

fn link_next(matches: &mut [Match], match_id: &str, next_id: &str) {
  if let Some(m) = matches.iter_mut().find(|m| m.id == match_id) {
    m.next_match_id = Some(next_id.to_string());
  }
}
