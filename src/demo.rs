//! A small card-matching game with the six instrumented entry points,
//! used by the replay runner and the integration tests.

use crate::game::{Card, GameView};
use crate::hooks::{GameEvent, Interceptor};
use crate::level::GameMode;

const XP_PER_MATCH: u32 = 10;
const XP_PER_MISS_PENALTY: u32 = 2;
const XP_PER_LEVEL: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryGame {
    flipped: Vec<Card>,
    turns: u32,
    level: u32,
    mode: Option<GameMode>,
    matches: u32,
    misses: u32,
    finished: bool,
}

impl MemoryGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    pub fn matches(&self) -> u32 {
        self.matches
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Turns the given cards face up, replacing whatever was showing
    pub fn flip<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flipped = labels.into_iter().map(Card::labelled).collect();
    }

    fn begin(&mut self, mode: GameMode, level: u32) {
        self.mode = Some(mode);
        self.level = level;
        self.turns = 0;
        self.matches = 0;
        self.misses = 0;
        self.finished = false;
        self.flipped.clear();
    }

    pub fn start_campaign_level(&mut self, level: u32) -> u32 {
        self.begin(GameMode::Campaign, level);
        level
    }

    pub fn start_reflex_mode(&mut self) {
        self.begin(GameMode::Reflex, 0);
    }

    pub fn correct_match(&mut self) -> u32 {
        self.turns += 1;
        self.matches += 1;
        self.flipped.clear();
        self.matches
    }

    pub fn incorrect_match(&mut self) -> u32 {
        self.turns += 1;
        self.misses += 1;
        self.flipped.clear();
        self.misses
    }

    pub fn campaign_win(&mut self) -> u32 {
        self.finished = true;
        self.calculate_xp()
    }

    pub fn reflex_end(&mut self) -> u32 {
        self.finished = true;
        self.calculate_xp()
    }
}

impl GameView for MemoryGame {
    fn flipped_cards(&self) -> &[Card] {
        &self.flipped
    }

    fn turns(&self) -> u32 {
        self.turns
    }

    fn current_level(&self) -> u32 {
        self.level
    }

    fn calculate_xp(&self) -> u32 {
        self.matches
            .saturating_mul(XP_PER_MATCH)
            .saturating_add(self.level.saturating_mul(XP_PER_LEVEL))
            .saturating_sub(self.misses.saturating_mul(XP_PER_MISS_PENALTY))
    }
}

/// [`MemoryGame`] whose entry points all pass through an [`Interceptor`]
pub struct InstrumentedGame {
    game: MemoryGame,
    interceptor: Interceptor,
}

impl InstrumentedGame {
    pub fn new(game: MemoryGame, interceptor: Interceptor) -> Self {
        Self { game, interceptor }
    }

    pub fn game(&self) -> &MemoryGame {
        &self.game
    }

    pub fn flip<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.game.flip(labels);
    }

    pub fn start_campaign_level(&mut self, level: u32) -> u32 {
        self.interceptor.intercept(
            GameEvent::CampaignLevelStarted { level },
            &mut self.game,
            |g| g.start_campaign_level(level),
        )
    }

    pub fn start_reflex_mode(&mut self) {
        self.interceptor
            .intercept(GameEvent::ReflexModeStarted, &mut self.game, |g| {
                g.start_reflex_mode()
            })
    }

    pub fn correct_match(&mut self) -> u32 {
        self.interceptor
            .intercept(GameEvent::MatchCorrect, &mut self.game, |g| {
                g.correct_match()
            })
    }

    pub fn incorrect_match(&mut self) -> u32 {
        self.interceptor
            .intercept(GameEvent::MatchIncorrect, &mut self.game, |g| {
                g.incorrect_match()
            })
    }

    pub fn campaign_win(&mut self) -> u32 {
        self.interceptor
            .intercept(GameEvent::CampaignWon, &mut self.game, |g| g.campaign_win())
    }

    pub fn reflex_end(&mut self) -> u32 {
        self.interceptor
            .intercept(GameEvent::ReflexEnded, &mut self.game, |g| g.reflex_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_count_turns_and_clear_cards() {
        let mut game = MemoryGame::new();
        game.start_campaign_level(2);
        game.flip(["A", "A"]);
        assert_eq!(game.flipped_cards().len(), 2);
        assert_eq!(game.correct_match(), 1);
        assert!(game.flipped_cards().is_empty());
        game.flip(["A", "B"]);
        assert_eq!(game.incorrect_match(), 1);
        assert_eq!(game.turns(), 2);
    }

    #[test]
    fn xp_rewards_matches_and_level() {
        let mut game = MemoryGame::new();
        game.start_campaign_level(3);
        game.correct_match();
        game.correct_match();
        game.incorrect_match();
        assert_eq!(game.calculate_xp(), 2 * 10 + 3 * 5 - 2);
        assert_eq!(game.campaign_win(), 33);
        assert!(game.is_finished());
    }

    #[test]
    fn xp_never_negative() {
        let mut game = MemoryGame::new();
        game.start_reflex_mode();
        for _ in 0..5 {
            game.incorrect_match();
        }
        assert_eq!(game.reflex_end(), 0);
    }

    #[test]
    fn huge_level_saturates_xp() {
        let mut game = MemoryGame::new();
        game.start_campaign_level(u32::MAX);
        game.correct_match();
        assert_eq!(game.campaign_win(), u32::MAX);

        let mut wrapped = InstrumentedGame::new(MemoryGame::new(), Interceptor::new());
        wrapped.start_campaign_level(1_000_000_000);
        assert_eq!(wrapped.campaign_win(), u32::MAX);
    }

    #[test]
    fn starting_resets_progress() {
        let mut game = MemoryGame::new();
        game.start_campaign_level(1);
        game.correct_match();
        game.start_reflex_mode();
        assert_eq!(game.mode(), Some(GameMode::Reflex));
        assert_eq!(game.turns(), 0);
        assert_eq!(game.matches(), 0);
    }

    #[test]
    fn uninstrumented_wrapper_behaves_like_game() {
        let mut plain = MemoryGame::new();
        let mut wrapped = InstrumentedGame::new(MemoryGame::new(), Interceptor::new());

        assert_eq!(plain.start_campaign_level(4), wrapped.start_campaign_level(4));
        plain.flip(["x", "x"]);
        wrapped.flip(["x", "x"]);
        assert_eq!(plain.correct_match(), wrapped.correct_match());
        assert_eq!(plain.incorrect_match(), wrapped.incorrect_match());
        assert_eq!(plain.campaign_win(), wrapped.campaign_win());
        assert_eq!(&plain, wrapped.game());
    }
}
