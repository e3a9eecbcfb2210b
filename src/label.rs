use serde::{Deserialize, Serialize};

use crate::records::MatchRecord;

/// Three-way match outcome from the home side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutcomeLabel {
    HomeWin = 0,
    Draw = 1,
    AwayWin = 2,
}

impl OutcomeLabel {
    pub const ALL: [OutcomeLabel; 3] = [Self::HomeWin, Self::Draw, Self::AwayWin];

    pub fn from_goals(home_goals: i32, away_goals: i32) -> Self {
        if home_goals > away_goals {
            Self::HomeWin
        } else if home_goals < away_goals {
            Self::AwayWin
        } else {
            Self::Draw
        }
    }

    pub fn class(self) -> u8 {
        self as u8
    }

    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(Self::HomeWin),
            1 => Some(Self::Draw),
            2 => Some(Self::AwayWin),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::HomeWin => "HOME_WIN",
            Self::Draw => "DRAW",
            Self::AwayWin => "AWAY_WIN",
        }
    }
}

pub fn label_for(record: &MatchRecord) -> Option<OutcomeLabel> {
    record
        .goals()
        .map(|(home, away)| OutcomeLabel::from_goals(home, away))
}
