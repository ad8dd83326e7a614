use std::collections::HashMap;

use serde::Serialize;

use crate::types::{BracketFormat, MatchStatus, Player, TournamentBracket};

/// Per-player accumulator over completed round-robin matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub player: Player,
    pub wins: u32,
    pub losses: u32,
    pub points_for: u32,
    pub points_against: u32,
}

impl PlayerStanding {
    pub fn point_diff(&self) -> i64 {
        i64::from(self.points_for) - i64::from(self.points_against)
    }
}

/// Order every player best to worst. Meaningful once the bracket is
/// completed; before that the result is a provisional snapshot (players
/// still alive rank by how deep they have advanced so far).
pub fn final_ranking(bracket: &TournamentBracket) -> Vec<Player> {
    match bracket.format {
        BracketFormat::RoundRobin => round_robin_ranking(bracket),
        BracketFormat::SingleElimination | BracketFormat::DoubleElimination => {
            elimination_ranking(bracket)
        }
    }
}

// ── Round robin ────────────────────────────────────────────────────────

/// Standings sorted by wins, then point differential, then player id.
pub fn round_robin_standings(bracket: &TournamentBracket) -> Vec<PlayerStanding> {
    let mut standings: Vec<PlayerStanding> = bracket
        .players
        .iter()
        .map(|player| PlayerStanding {
            player: player.clone(),
            wins: 0,
            losses: 0,
            points_for: 0,
            points_against: 0,
        })
        .collect();
    let index: HashMap<&str, usize> = bracket
        .players
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.as_str(), i))
        .collect();

    for m in &bracket.matches {
        if m.status != MatchStatus::Completed {
            continue;
        }
        let (Some(p1), Some(p2), Some(score), Some(winner)) =
            (&m.player1, &m.player2, &m.score, &m.winner)
        else {
            continue;
        };
        let (Some(&i1), Some(&i2)) = (index.get(p1.id.as_str()), index.get(p2.id.as_str()))
        else {
            continue;
        };
        standings[i1].points_for += score.player1_score;
        standings[i1].points_against += score.player2_score;
        standings[i2].points_for += score.player2_score;
        standings[i2].points_against += score.player1_score;
        if winner.id == p1.id {
            standings[i1].wins += 1;
            standings[i2].losses += 1;
        } else {
            standings[i2].wins += 1;
            standings[i1].losses += 1;
        }
    }

    standings.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(b.point_diff().cmp(&a.point_diff()))
            .then(a.player.id.cmp(&b.player.id))
    });
    standings
}

fn round_robin_ranking(bracket: &TournamentBracket) -> Vec<Player> {
    let mut standings = round_robin_standings(bracket);

    // Exact two-way ties on wins and differential fall back to the
    // head-to-head result; larger tie groups keep the stable id order.
    let mut start = 0;
    while start < standings.len() {
        let mut end = start + 1;
        while end < standings.len()
            && standings[end].wins == standings[start].wins
            && standings[end].point_diff() == standings[start].point_diff()
        {
            end += 1;
        }
        if end - start == 2 {
            let first = standings[start].player.id.clone();
            let second = standings[start + 1].player.id.clone();
            if head_to_head_winner(bracket, &first, &second).as_deref() == Some(second.as_str()) {
                standings.swap(start, start + 1);
            }
        }
        start = end;
    }

    standings.into_iter().map(|s| s.player).collect()
}

fn head_to_head_winner(bracket: &TournamentBracket, a: &str, b: &str) -> Option<String> {
    bracket
        .matches
        .iter()
        .find(|m| {
            m.status == MatchStatus::Completed && m.contains_player(a) && m.contains_player(b)
        })
        .and_then(|m| m.winner.as_ref())
        .map(|w| w.id.clone())
}

// ── Elimination formats ────────────────────────────────────────────────

/// The bracket winner ranks first; everyone else by the round of their
/// last loss, descending — a later exit is a better placement. A player
/// who drew a first-round bye ranks by the round of the eventual loss.
fn elimination_ranking(bracket: &TournamentBracket) -> Vec<Player> {
    // Depth score per player: winning in round r counts 2r, losing counts
    // 2r − 1, so survivors of a round always outrank its losers.
    let mut depth: HashMap<&str, u32> = bracket
        .players
        .iter()
        .map(|p| (p.id.as_str(), 0))
        .collect();
    for m in &bracket.matches {
        if m.status != MatchStatus::Completed {
            continue;
        }
        let Some(winner) = &m.winner else { continue };
        if let Some(entry) = depth.get_mut(winner.id.as_str()) {
            *entry = (*entry).max(m.round * 2);
        }
        if let Some(loser) = m.loser() {
            if let Some(entry) = depth.get_mut(loser.id.as_str()) {
                *entry = (*entry).max(m.round * 2 - 1);
            }
        }
    }

    let mut ranking: Vec<Player> = Vec::with_capacity(bracket.players.len());
    if let Some(winner) = &bracket.winner {
        ranking.push(winner.clone());
    }
    let champion_id = bracket.winner.as_ref().map(|w| w.id.as_str());
    let mut others: Vec<&Player> = bracket
        .players
        .iter()
        .filter(|p| Some(p.id.as_str()) != champion_id)
        .collect();
    // Stable sort: ties keep the roster order.
    others.sort_by(|a, b| {
        let da = depth.get(a.id.as_str()).copied().unwrap_or(0);
        let db = depth.get(b.id.as_str()).copied().unwrap_or(0);
        db.cmp(&da)
    });
    ranking.extend(others.into_iter().cloned());
    ranking
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::generate_seeded;
    use crate::progression::report_result;
    use crate::types::{
        BracketSide, BracketStatus, Match, MatchScore, TournamentBracket,
    };

    fn player(id: &str) -> Player {
        Player {
            id: id.to_string(),
            name: id.to_uppercase(),
            avatar: format!("https://example.com/avatars/{id}.png"),
            seed: None,
        }
    }

    fn completed_match(id: &str, p1: &Player, p2: &Player, winner: &Player, s1: u32, s2: u32) -> Match {
        Match {
            id: id.to_string(),
            tournament_id: "t1".to_string(),
            round: 1,
            position: 0,
            side: BracketSide::Winners,
            player1: Some(p1.clone()),
            player2: Some(p2.clone()),
            winner: Some(winner.clone()),
            score: Some(MatchScore {
                player1_score: s1,
                player2_score: s2,
            }),
            status: MatchStatus::Completed,
            next_match_id: None,
            previous_match1_id: None,
            previous_match2_id: None,
        }
    }

    fn round_robin_bracket(players: Vec<Player>, matches: Vec<Match>) -> TournamentBracket {
        TournamentBracket {
            id: "t1".to_string(),
            name: "Round Robin".to_string(),
            format: BracketFormat::RoundRobin,
            players,
            matches,
            current_round: 1,
            total_rounds: 1,
            status: BracketStatus::Completed,
            winner: None,
        }
    }

    fn ids(players: &[Player]) -> Vec<&str> {
        players.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_three_player_round_robin_ranking() {
        let roster = vec![player("a"), player("b"), player("c")];
        let mut bracket =
            generate_seeded(BracketFormat::RoundRobin, &roster, "t1", 3).unwrap();
        let pairings: Vec<(String, String, String)> = bracket
            .matches
            .iter()
            .map(|m| {
                (
                    m.id.clone(),
                    m.player1.as_ref().unwrap().id.clone(),
                    m.player2.as_ref().unwrap().id.clone(),
                )
            })
            .collect();
        for (match_id, p1, p2) in pairings {
            // A beats everyone, B beats C.
            let winner = if p1 == "a" || p2 == "a" {
                "a"
            } else if p1 == "b" || p2 == "b" {
                "b"
            } else {
                unreachable!()
            };
            report_result(&mut bracket, &match_id, winner, MatchScore {
                player1_score: if p1 == winner { 3 } else { 1 },
                player2_score: if p2 == winner { 3 } else { 1 },
            })
            .unwrap();
        }
        assert!(bracket.is_completed());
        let ranking = final_ranking(&bracket);
        assert_eq!(ids(&ranking), ["a", "b", "c"]);
    }

    #[test]
    fn test_round_robin_head_to_head_breaks_two_way_ties() {
        let (a, b, c, d) = (player("a"), player("b"), player("c"), player("d"));
        // a and b finish 2-1 with identical differentials, as do c and d;
        // b beat a and c beat d.
        let matches = vec![
            completed_match("m1", &a, &b, &b, 0, 2),
            completed_match("m2", &a, &c, &a, 2, 0),
            completed_match("m3", &a, &d, &a, 2, 0),
            completed_match("m4", &b, &c, &b, 2, 0),
            completed_match("m5", &b, &d, &d, 0, 2),
            completed_match("m6", &c, &d, &c, 2, 0),
        ];
        let bracket = round_robin_bracket(vec![a, b, c, d], matches);
        let standings = round_robin_standings(&bracket);
        assert_eq!(standings[0].wins, 2);
        assert_eq!(standings[1].wins, 2);
        assert_eq!(standings[0].point_diff(), standings[1].point_diff());
        let ranking = final_ranking(&bracket);
        assert_eq!(ids(&ranking), ["b", "a", "c", "d"]);
    }

    #[test]
    fn test_round_robin_larger_tie_groups_fall_back_to_id_order() {
        let (a, b, c) = (player("a"), player("b"), player("c"));
        // A perfect cycle with identical scores: all three tie on wins and
        // differential, so the stable id order decides.
        let matches = vec![
            completed_match("m1", &a, &b, &a, 2, 1),
            completed_match("m2", &b, &c, &b, 2, 1),
            completed_match("m3", &c, &a, &c, 2, 1),
        ];
        let bracket = round_robin_bracket(vec![c.clone(), a.clone(), b.clone()], matches);
        let ranking = final_ranking(&bracket);
        assert_eq!(ids(&ranking), ["a", "b", "c"]);
    }

    #[test]
    fn test_elimination_ranking_orders_by_exit_round() {
        let roster: Vec<Player> = (1..=4).map(|i| player(&format!("p{i}"))).collect();
        let mut bracket =
            generate_seeded(BracketFormat::SingleElimination, &roster, "t1", 9).unwrap();
        let round_one: Vec<Match> = bracket
            .matches
            .iter()
            .filter(|m| m.round == 1)
            .cloned()
            .collect();
        let w1 = round_one[0].player1.clone().unwrap();
        let w2 = round_one[1].player1.clone().unwrap();
        let score = MatchScore {
            player1_score: 2,
            player2_score: 0,
        };
        report_result(&mut bracket, &round_one[0].id, &w1.id, score).unwrap();
        report_result(&mut bracket, &round_one[1].id, &w2.id, score).unwrap();
        let final_id = bracket
            .matches
            .iter()
            .find(|m| m.round == 2)
            .unwrap()
            .id
            .clone();
        report_result(&mut bracket, &final_id, &w1.id, score).unwrap();

        let ranking = final_ranking(&bracket);
        assert_eq!(ranking[0], w1);
        assert_eq!(ranking[1], w2);
        // Both remaining players fell in round one; roster order breaks the tie.
        let first_round_losers: Vec<&Player> = bracket
            .players
            .iter()
            .filter(|p| p.id != w1.id && p.id != w2.id)
            .collect();
        assert_eq!(ranking[2], *first_round_losers[0]);
        assert_eq!(ranking[3], *first_round_losers[1]);
    }

    #[test]
    fn test_bye_player_ranks_by_eventual_loss() {
        let roster: Vec<Player> = (1..=3).map(|i| player(&format!("p{i}"))).collect();
        let mut bracket =
            generate_seeded(BracketFormat::SingleElimination, &roster, "t1", 4).unwrap();
        let opener = bracket
            .matches
            .iter()
            .find(|m| m.round == 1 && m.has_both_players())
            .unwrap()
            .clone();
        let bye_player = bracket
            .matches
            .iter()
            .find(|m| m.round == 1 && !m.has_both_players())
            .unwrap()
            .winner
            .clone()
            .unwrap();
        let score = MatchScore {
            player1_score: 2,
            player2_score: 0,
        };
        let opener_winner = opener.player1.clone().unwrap();
        let opener_loser = opener.player2.clone().unwrap();
        report_result(&mut bracket, &opener.id, &opener_winner.id, score).unwrap();
        let final_id = bracket
            .matches
            .iter()
            .find(|m| m.round == 2)
            .unwrap()
            .id
            .clone();
        report_result(&mut bracket, &final_id, &opener_winner.id, score).unwrap();

        // The bye holder lost in round two and outranks the round-one loser.
        let ranking = final_ranking(&bracket);
        assert_eq!(ranking[0], opener_winner);
        assert_eq!(ranking[1], bye_player);
        assert_eq!(ranking[2], opener_loser);
    }

    #[test]
    fn test_ranking_is_total_before_completion() {
        let roster: Vec<Player> = (1..=8).map(|i| player(&format!("p{i}"))).collect();
        let bracket =
            generate_seeded(BracketFormat::SingleElimination, &roster, "t1", 6).unwrap();
        let ranking = final_ranking(&bracket);
        assert_eq!(ranking.len(), 8);
        let bracket = generate_seeded(BracketFormat::RoundRobin, &roster, "t1", 6).unwrap();
        assert_eq!(final_ranking(&bracket).len(), 8);
    }
}
