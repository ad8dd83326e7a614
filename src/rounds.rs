use crate::types::{BracketFormat, BracketSide, Match, Round, TournamentBracket};

/// Project the flat match list into named, display-ordered rounds.
/// Read-only: calling it never changes the bracket, and calling it twice
/// on the same value yields the same rounds.
pub fn rounds_of(bracket: &TournamentBracket) -> Vec<Round> {
    match bracket.format {
        BracketFormat::RoundRobin => vec![make_round(
            1,
            "Round Robin".to_string(),
            bracket.matches.clone(),
        )],
        BracketFormat::SingleElimination => (1..=bracket.total_rounds)
            .map(|number| {
                let matches = matches_in_round(bracket, number, None);
                make_round(
                    number,
                    elimination_round_name(number, bracket.total_rounds),
                    matches,
                )
            })
            .collect(),
        BracketFormat::DoubleElimination => double_elimination_rounds(bracket),
    }
}

fn double_elimination_rounds(bracket: &TournamentBracket) -> Vec<Round> {
    let mut rounds = Vec::new();

    let winners_rounds = bracket
        .matches
        .iter()
        .filter(|m| m.side == BracketSide::Winners)
        .map(|m| m.round)
        .max()
        .unwrap_or(0);
    for number in 1..=winners_rounds {
        let matches = matches_in_round(bracket, number, Some(BracketSide::Winners));
        let name = format!("Winners {}", elimination_round_name(number, winners_rounds));
        rounds.push(make_round(number, name, matches));
    }

    let mut losers_round_numbers: Vec<u32> = bracket
        .matches
        .iter()
        .filter(|m| m.side == BracketSide::Losers)
        .map(|m| m.round)
        .collect();
    losers_round_numbers.sort_unstable();
    losers_round_numbers.dedup();
    for (i, number) in losers_round_numbers.iter().enumerate() {
        let matches = matches_in_round(bracket, *number, Some(BracketSide::Losers));
        rounds.push(make_round(*number, format!("Losers Round {}", i + 1), matches));
    }

    for (side, name) in [
        (BracketSide::LosersFinal, "Losers Final"),
        (BracketSide::GrandFinal, "Grand Final"),
    ] {
        let matches: Vec<Match> = bracket
            .matches
            .iter()
            .filter(|m| m.side == side)
            .cloned()
            .collect();
        if let Some(number) = matches.first().map(|m| m.round) {
            rounds.push(make_round(number, name.to_string(), matches));
        }
    }

    rounds
}

fn matches_in_round(
    bracket: &TournamentBracket,
    number: u32,
    side: Option<BracketSide>,
) -> Vec<Match> {
    bracket
        .matches
        .iter()
        .filter(|m| m.round == number && side.map_or(true, |s| m.side == s))
        .cloned()
        .collect()
}

fn make_round(number: u32, name: String, matches: Vec<Match>) -> Round {
    let is_completed = matches.iter().all(|m| m.status.is_resolved());
    Round {
        number,
        name,
        matches,
        is_completed,
    }
}

fn elimination_round_name(number: u32, total: u32) -> String {
    match total.saturating_sub(number) {
        0 => "Final".to_string(),
        1 => "Semifinal".to_string(),
        2 => "Quarterfinal".to_string(),
        3 => "Round of 16".to_string(),
        _ => format!("Round {number}"),
    }
}
