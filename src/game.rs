pub const UNKNOWN_LABEL: &str = "unknown";

/// A face-up card as the game renders it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Card {
    pub label: Option<String>,
}

impl Card {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }
}

/// Read-only view of the game state that hooks are allowed to look at
pub trait GameView {
    fn flipped_cards(&self) -> &[Card];

    fn turns(&self) -> u32;

    fn current_level(&self) -> u32;

    /// Game-supplied XP calculation for the level in progress
    fn calculate_xp(&self) -> u32;
}

/// Labels of the two currently flipped cards, `fallback` where missing
pub fn flipped_labels<G: GameView + ?Sized>(game: &G, fallback: &str) -> (String, String) {
    let label = |idx: usize| {
        game.flipped_cards()
            .get(idx)
            .and_then(|c| c.label.as_deref())
            .filter(|l| !l.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };
    (label(0), label(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Board {
        flipped: Vec<Card>,
    }

    impl GameView for Board {
        fn flipped_cards(&self) -> &[Card] {
            &self.flipped
        }
        fn turns(&self) -> u32 {
            0
        }
        fn current_level(&self) -> u32 {
            1
        }
        fn calculate_xp(&self) -> u32 {
            0
        }
    }

    #[test]
    fn reads_both_labels() {
        let board = Board {
            flipped: vec![Card::labelled("cat"), Card::labelled("dog")],
        };
        assert_eq!(
            flipped_labels(&board, UNKNOWN_LABEL),
            ("cat".to_string(), "dog".to_string())
        );
    }

    #[test]
    fn missing_cards_use_fallback() {
        let board = Board {
            flipped: vec![Card::labelled("cat")],
        };
        assert_eq!(
            flipped_labels(&board, UNKNOWN_LABEL),
            ("cat".to_string(), "unknown".to_string())
        );

        let empty = Board { flipped: vec![] };
        assert_eq!(
            flipped_labels(&empty, "?"),
            ("?".to_string(), "?".to_string())
        );
    }

    #[test]
    fn unlabelled_or_blank_cards_use_fallback() {
        let board = Board {
            flipped: vec![Card::default(), Card::labelled("")],
        };
        assert_eq!(
            flipped_labels(&board, UNKNOWN_LABEL),
            ("unknown".to_string(), "unknown".to_string())
        );
    }
}
