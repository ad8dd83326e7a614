use tracing::{debug, info};

use crate::types::{
  BracketError, BracketFormat, BracketSide, BracketStatus, MatchScore, MatchStatus, Player,
  TournamentBracket,
};

/// Mark a match as underway. The transition is optional — `report_result`
/// accepts pending matches too — but lets the caller surface live state.
pub fn start_match(bracket: &mut TournamentBracket, match_id: &str) -> Result<(), BracketError> {
  let index = bracket
    .match_position(match_id)
    .ok_or_else(|| BracketError::MatchNotFound(match_id.to_string()))?;
  {
    let m = &bracket.matches[index];
    match m.status {
      MatchStatus::Pending => {}
      MatchStatus::InProgress => {
        return Err(BracketError::MatchAlreadyStarted(match_id.to_string()))
      }
      MatchStatus::Completed | MatchStatus::Skipped => {
        return Err(BracketError::MatchAlreadyResolved(match_id.to_string()))
      }
    }
    if !m.has_both_players() {
      return Err(BracketError::MissingPlayers(match_id.to_string()));
    }
  }
  bracket.matches[index].status = MatchStatus::InProgress;
  if bracket.status == BracketStatus::Setup {
    bracket.status = BracketStatus::InProgress;
  }
  Ok(())
}

/// Apply one reported result and advance the graph: the winner moves along
/// the next-match link, a winners-bracket loser drops into the losers
/// bracket, byes cascade, the round cursor catches up, and terminal state
/// is detected. Rejects without touching the bracket when the match is
/// unknown, already resolved, not fully populated, or the winner is not
/// one of its two players.
pub fn report_result(
  bracket: &mut TournamentBracket,
  match_id: &str,
  winner_id: &str,
  score: MatchScore,
) -> Result<(), BracketError> {
  let index = bracket
    .match_position(match_id)
    .ok_or_else(|| BracketError::MatchNotFound(match_id.to_string()))?;

  let (winner, loser) = {
    let m = &bracket.matches[index];
    if m.status.is_resolved() {
      return Err(BracketError::MatchAlreadyResolved(match_id.to_string()));
    }
    match (&m.player1, &m.player2) {
      (Some(p1), Some(p2)) if p1.id == winner_id => (p1.clone(), p2.clone()),
      (Some(p1), Some(p2)) if p2.id == winner_id => (p2.clone(), p1.clone()),
      (Some(_), Some(_)) => {
        return Err(BracketError::WinnerNotInMatch {
          match_id: match_id.to_string(),
          winner_id: winner_id.to_string(),
        })
      }
      _ => return Err(BracketError::MissingPlayers(match_id.to_string())),
    }
  };

  let side = {
    let m = &mut bracket.matches[index];
    m.winner = Some(winner.clone());
    m.score = Some(score);
    m.status = MatchStatus::Completed;
    m.side
  };
  debug!(match_id, winner = %winner.id, "result recorded");

  if bracket.format == BracketFormat::DoubleElimination && side == BracketSide::Winners {
    route_loser(bracket, &loser);
  }

  resolve_pending(bracket);
  advance_round(bracket);
  finish_if_terminal(bracket);
  Ok(())
}

// ── Loser routing (double elimination) ─────────────────────────────────

/// Drop a winners-bracket loser into the first losers-side match, in
/// creation order, that still has an open slot — `player1` before
/// `player2`. A slot is open only when no predecessor link feeds it.
fn route_loser(bracket: &mut TournamentBracket, loser: &Player) {
  for m in bracket.matches.iter_mut() {
    if !matches!(m.side, BracketSide::Losers | BracketSide::LosersFinal) {
      continue;
    }
    if m.status != MatchStatus::Pending {
      continue;
    }
    if m.player1.is_none() && m.previous_match1_id.is_none() {
      m.player1 = Some(loser.clone());
      debug!(match_id = %m.id, player = %loser.id, "loser dropped to losers bracket");
      return;
    }
    if m.player2.is_none() && m.previous_match2_id.is_none() {
      m.player2 = Some(loser.clone());
      debug!(match_id = %m.id, player = %loser.id, "loser dropped to losers bracket");
      return;
    }
  }
  debug!(player = %loser.id, "no open losers slot; player eliminated");
}

// ── Resolution cascade ─────────────────────────────────────────────────

/// Run the graph to a fixpoint: pull winners of resolved feeders into the
/// slots they are linked to, then resolve any pending match whose empty
/// slots can provably never fill — one occupant makes it a bye (the
/// occupant wins), none makes it void. Runs at generation time and after
/// every reported result.
pub(crate) fn resolve_pending(bracket: &mut TournamentBracket) {
  if bracket.format == BracketFormat::RoundRobin {
    return;
  }
  let mut safety = 0;
  loop {
    safety += 1;
    if safety > 1000 {
      break;
    }
    let mut progressed = false;
    for index in 0..bracket.matches.len() {
      if bracket.matches[index].status != MatchStatus::Pending {
        continue;
      }
      progressed |= fill_from_links(bracket, index);
      progressed |= resolve_if_dead(bracket, index);
    }
    if !progressed {
      break;
    }
  }
}

fn fill_from_links(bracket: &mut TournamentBracket, index: usize) -> bool {
  let mut changed = false;

  let slot1 = {
    let m = &bracket.matches[index];
    if m.player1.is_some() {
      None
    } else {
      feeder_winner(bracket, m.previous_match1_id.as_deref())
    }
  };
  if let Some(player) = slot1 {
    bracket.matches[index].player1 = Some(player);
    changed = true;
  }

  let slot2 = {
    let m = &bracket.matches[index];
    if m.player2.is_some() {
      None
    } else {
      feeder_winner(bracket, m.previous_match2_id.as_deref())
    }
  };
  if let Some(player) = slot2 {
    bracket.matches[index].player2 = Some(player);
    changed = true;
  }

  changed
}

fn feeder_winner(bracket: &TournamentBracket, feeder_id: Option<&str>) -> Option<Player> {
  let feeder = bracket.match_by_id(feeder_id?)?;
  if feeder.status == MatchStatus::Completed {
    feeder.winner.clone()
  } else {
    None
  }
}

fn resolve_if_dead(bracket: &mut TournamentBracket, index: usize) -> bool {
  let resolvable = {
    let m = &bracket.matches[index];
    let slot1_blocked = m.player1.is_none()
      && !slot_is_dead(bracket, m.previous_match1_id.as_deref(), m.side);
    let slot2_blocked = m.player2.is_none()
      && !slot_is_dead(bracket, m.previous_match2_id.as_deref(), m.side);
    !m.has_both_players() && !slot1_blocked && !slot2_blocked
  };
  if !resolvable {
    return false;
  }

  let m = &mut bracket.matches[index];
  let occupant = m.player1.clone().or_else(|| m.player2.clone());
  match occupant {
    Some(player) => {
      m.winner = Some(player);
      m.status = MatchStatus::Completed;
      debug!(match_id = %m.id, "bye auto-resolved");
    }
    None => {
      m.status = MatchStatus::Skipped;
      debug!(match_id = %m.id, "void match skipped");
    }
  }
  true
}

/// Whether an empty slot can never be filled. A link-fed slot dies with a
/// feeder that resolved without a winner; an open winners-side slot is dead
/// from the start (nothing ever routes into the winners bracket); an open
/// losers-side slot stays live until the whole winners side has resolved.
fn slot_is_dead(bracket: &TournamentBracket, previous: Option<&str>, side: BracketSide) -> bool {
  match previous {
    Some(feeder_id) => match bracket.match_by_id(feeder_id) {
      Some(feeder) => feeder.status.is_resolved() && feeder.winner.is_none(),
      None => true,
    },
    None => match side {
      BracketSide::Winners => true,
      BracketSide::Losers | BracketSide::LosersFinal => winners_side_resolved(bracket),
      BracketSide::GrandFinal => false,
    },
  }
}

fn winners_side_resolved(bracket: &TournamentBracket) -> bool {
  bracket
    .matches
    .iter()
    .filter(|m| m.side == BracketSide::Winners)
    .all(|m| m.status.is_resolved())
}

// ── Round cursor & terminal state ──────────────────────────────────────

fn advance_round(bracket: &mut TournamentBracket) {
  if bracket.format == BracketFormat::RoundRobin {
    return;
  }
  while bracket.current_round < bracket.total_rounds {
    let round = bracket.current_round;
    let round_done = bracket
      .matches
      .iter()
      .filter(|m| m.round == round)
      .all(|m| m.status.is_resolved());
    if !round_done {
      break;
    }
    bracket.current_round += 1;
    debug!(round = bracket.current_round, "round cursor advanced");
  }
}

fn finish_if_terminal(bracket: &mut TournamentBracket) {
  let winner = match bracket.format {
    BracketFormat::RoundRobin => {
      // Ranking order supplies the champion; completion is all that matters.
      if bracket
        .matches
        .iter()
        .all(|m| m.status == MatchStatus::Completed)
      {
        bracket.status = BracketStatus::Completed;
        info!(tournament = %bracket.id, "tournament completed");
      } else {
        bracket.status = BracketStatus::InProgress;
      }
      return;
    }
    BracketFormat::SingleElimination => bracket
      .matches
      .iter()
      .find(|m| m.next_match_id.is_none())
      .filter(|m| m.status == MatchStatus::Completed)
      .and_then(|m| m.winner.clone()),
    BracketFormat::DoubleElimination => bracket
      .matches
      .iter()
      .find(|m| m.side == BracketSide::GrandFinal)
      .filter(|m| m.status == MatchStatus::Completed)
      .and_then(|m| m.winner.clone()),
  };

  match winner {
    Some(player) => {
      info!(tournament = %bracket.id, winner = %player.id, "tournament completed");
      bracket.winner = Some(player);
      bracket.status = BracketStatus::Completed;
    }
    None => bracket.status = BracketStatus::InProgress,
  }
}
