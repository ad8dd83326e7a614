use serde::{Deserialize, Serialize};

// ── Constants ──────────────────────────────────────────────────────────

pub const DEFAULT_DETECTION_ENDPOINT: &str = "https://deep-darts.fly.dev/api/detect";
pub const DEFAULT_DETECTION_TIMEOUT_MS: u64 = 15_000;

// ── Roster types ───────────────────────────────────────────────────────

/// A tournament participant. Owned by the roster provider; the engine
/// references players by value but never edits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub seed: Option<u32>,
}

// ── Match graph types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketFormat {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
}

impl BracketFormat {
    pub fn display_name(self) -> &'static str {
        match self {
            BracketFormat::SingleElimination => "Single Elimination",
            BracketFormat::DoubleElimination => "Double Elimination",
            BracketFormat::RoundRobin => "Round Robin",
        }
    }
}

/// Which region of a double-elimination graph a match belongs to.
/// Single elimination and round robin matches always carry `Winners`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSide {
    Winners,
    Losers,
    LosersFinal,
    GrandFinal,
}

/// Match status is monotonic: pending → (in_progress) → completed.
/// `Skipped` is reserved for structurally void matches — pairings that can
/// never receive a player because the roster was not a power of two. The
/// Progression Engine never produces it from a reported result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl MatchStatus {
    pub fn is_resolved(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Skipped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub player1_score: u32,
    pub player2_score: u32,
}

/// The atomic node of the match graph. `previous_match1_id` feeds the
/// `player1` slot and `previous_match2_id` the `player2` slot; that pairing
/// is the only linking contract the Progression Engine relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub tournament_id: String,
    pub round: u32,
    pub position: u32,
    pub side: BracketSide,
    pub player1: Option<Player>,
    pub player2: Option<Player>,
    pub winner: Option<Player>,
    pub score: Option<MatchScore>,
    pub status: MatchStatus,
    pub next_match_id: Option<String>,
    pub previous_match1_id: Option<String>,
    pub previous_match2_id: Option<String>,
}

impl Match {
    pub fn has_both_players(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }

    pub fn contains_player(&self, player_id: &str) -> bool {
        self.player1.as_ref().map(|p| p.id.as_str()) == Some(player_id)
            || self.player2.as_ref().map(|p| p.id.as_str()) == Some(player_id)
    }

    /// The non-winner, when the match was decided between two players.
    /// Byes have a winner but no loser.
    pub fn loser(&self) -> Option<&Player> {
        let winner = self.winner.as_ref()?;
        match (&self.player1, &self.player2) {
            (Some(p1), Some(p2)) if p1.id == winner.id => Some(p2),
            (Some(p1), Some(p2)) if p2.id == winner.id => Some(p1),
            _ => None,
        }
    }
}

// ── Bracket aggregate ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketStatus {
    Setup,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentBracket {
    pub id: String,
    pub name: String,
    pub format: BracketFormat,
    pub players: Vec<Player>,
    pub matches: Vec<Match>,
    pub current_round: u32,
    pub total_rounds: u32,
    pub status: BracketStatus,
    pub winner: Option<Player>,
}

impl TournamentBracket {
    pub fn match_by_id(&self, match_id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub(crate) fn match_position(&self, match_id: &str) -> Option<usize> {
        self.matches.iter().position(|m| m.id == match_id)
    }

    pub fn is_completed(&self) -> bool {
        self.status == BracketStatus::Completed
    }
}

// ── Display projection ─────────────────────────────────────────────────

/// A named group of matches for rendering. Derived by the Round View,
/// never stored and never consulted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub number: u32,
    pub name: String,
    pub matches: Vec<Match>,
    pub is_completed: bool,
}

// ── Errors ─────────────────────────────────────────────────────────────

/// Configuration errors at generation time and precondition violations at
/// result-report time. Every violation rejects the call and leaves the
/// bracket unchanged.
#[derive(Debug, thiserror::Error)]
pub enum BracketError {
    #[error("A tournament needs at least two players (got {count}).")]
    NotEnoughPlayers { count: usize },
    #[error("Match not found: {0}.")]
    MatchNotFound(String),
    #[error("Match is already resolved: {0}.")]
    MatchAlreadyResolved(String),
    #[error("Match has already started: {0}.")]
    MatchAlreadyStarted(String),
    #[error("Match is missing a player: {0}.")]
    MissingPlayers(String),
    #[error("Player {winner_id} is not part of match {match_id}.")]
    WinnerNotInMatch { match_id: String, winner_id: String },
}
