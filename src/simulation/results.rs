//! Round records and the aggregate experiment results

use serde::{Deserialize, Serialize};

/// Outcome of a single round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Player,
    Opponent,
    Tie,
}

/// Immutable record of one finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    pub round: u32,
    pub player_speed: f32,
    pub opponent_speed: f32,
    /// Points awarded to the player this round
    pub player_score: u32,
    /// Points awarded to the opponent this round
    pub opponent_score: u32,
    pub winner: Winner,
    /// Last reaction time recorded before the round ended (ms), 0 if none
    pub reaction_time: f64,
    /// Wall clock (ms since epoch)
    pub timestamp: u64,
}

/// Summary sent to the viewer once all rounds are played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentResults {
    pub score: u32,
    pub opponent_score: u32,
    pub total_rounds: u32,
    pub win_rate: f64,
    pub average_speed: f64,
    pub high_speed_rate: f64,
    pub low_speed_rate: f64,
    pub reaction_times: Vec<f64>,
    pub speed_choices: Vec<f32>,
    pub rounds: Vec<RoundRecord>,
}

impl ExperimentResults {
    /// Aggregate the accumulated experiment data
    pub fn compute(
        score: u32,
        opponent_score: u32,
        total_rounds: u32,
        high_speed_threshold: f32,
        reaction_times: &[f64],
        speed_choices: &[f32],
        rounds: &[RoundRecord],
    ) -> Self {
        let player_wins = rounds.iter().filter(|r| r.winner == Winner::Player).count();
        let win_rate = if total_rounds > 0 {
            player_wins as f64 / f64::from(total_rounds)
        } else {
            0.0
        };

        let (average_speed, high_speed_rate, low_speed_rate) = if speed_choices.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let count = speed_choices.len() as f64;
            let total: f64 = speed_choices.iter().map(|&s| f64::from(s)).sum();
            let high = speed_choices
                .iter()
                .filter(|&&s| s >= high_speed_threshold)
                .count() as f64;
            (total / count, high / count, (count - high) / count)
        };

        Self {
            score,
            opponent_score,
            total_rounds,
            win_rate,
            average_speed,
            high_speed_rate,
            low_speed_rate,
            reaction_times: reaction_times.to_vec(),
            speed_choices: speed_choices.to_vec(),
            rounds: rounds.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(round: u32, winner: Winner) -> RoundRecord {
        RoundRecord {
            round,
            player_speed: 40.0,
            opponent_speed: 30.0,
            player_score: 10,
            opponent_score: 0,
            winner,
            reaction_time: 0.0,
            timestamp: 0,
        }
    }

    #[test]
    fn test_speed_ratios() {
        let rounds = vec![record(1, Winner::Player), record(2, Winner::Opponent)];
        let results = ExperimentResults::compute(
            10,
            10,
            2,
            40.0,
            &[1200.0],
            &[20.0, 40.0, 50.0, 30.0],
            &rounds,
        );

        assert_eq!(results.win_rate, 0.5);
        assert_eq!(results.average_speed, 35.0);
        assert_eq!(results.high_speed_rate, 0.5);
        assert_eq!(results.low_speed_rate, 0.5);
        assert_eq!(results.rounds.len(), 2);
    }

    #[test]
    fn test_no_choices_yields_zero_ratios() {
        let results = ExperimentResults::compute(0, 0, 10, 40.0, &[], &[], &[]);
        assert_eq!(results.average_speed, 0.0);
        assert_eq!(results.high_speed_rate, 0.0);
        assert_eq!(results.low_speed_rate, 0.0);
    }

    #[test]
    fn test_camel_case_json() {
        let results = ExperimentResults::compute(5, 5, 1, 40.0, &[], &[40.0], &[record(1, Winner::Tie)]);
        let json = serde_json::to_value(&results).unwrap();

        assert_eq!(json["opponentScore"], 5);
        assert_eq!(json["totalRounds"], 1);
        assert_eq!(json["highSpeedRate"], 1.0);
        assert_eq!(json["rounds"][0]["winner"], "tie");
        assert!(json["rounds"][0].get("reactionTime").is_some());
    }
}
