/// Score, collectibles and the exit condition for one level.
///
/// ```text
///   can_complete = (!require_all_gold || gold_collected >= gold_total)
///               && (!require_key      || has_key)
/// ```

use crate::config::LevelConfig;

#[derive(Clone, Debug)]
pub struct Progress {
    pub score: u32,
    pub gold_collected: usize,
    pub gold_total: usize,
    pub has_key: bool,
    pub completed: bool,
    rules: LevelConfig,
}

impl Progress {
    pub fn new(rules: LevelConfig, gold_total: usize) -> Self {
        Progress { score: 0, gold_collected: 0, gold_total, has_key: false, completed: false, rules }
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        log::trace!("score: {}", self.score);
    }

    /// Returns true when this was the last piece of gold.
    pub fn collect_gold(&mut self) -> bool {
        self.gold_collected += 1;
        self.add_score(self.rules.gold_score);
        log::debug!("gold {}/{}", self.gold_collected, self.gold_total);
        let all = self.gold_collected >= self.gold_total;
        if all && self.can_complete_level() {
            log::info!("exit unlocked");
        }
        all
    }

    pub fn collect_key(&mut self) {
        self.has_key = true;
        self.add_score(self.rules.key_score);
        log::debug!("key collected");
        if self.can_complete_level() {
            log::info!("exit unlocked");
        }
    }

    pub fn enemy_crushed(&mut self) {
        self.add_score(self.rules.crush_score);
    }

    pub fn can_complete_level(&self) -> bool {
        let gold = !self.rules.require_all_gold || self.gold_collected >= self.gold_total;
        let key = !self.rules.require_key || self.has_key;
        gold && key
    }

    /// Returns false (and changes nothing) while the exit is still locked.
    pub fn complete_level(&mut self) -> bool {
        if !self.can_complete_level() {
            log::warn!("level cannot be completed yet");
            return false;
        }
        if !self.completed {
            self.completed = true;
            log::info!("level complete, score {}", self.score);
        }
        true
    }

    /// Back to a fresh run of the same level: score, gold and key cleared.
    /// `gold_total` is recounted by the caller.
    pub fn reset_level(&mut self, gold_total: usize) {
        self.score = 0;
        self.gold_collected = 0;
        self.gold_total = gold_total;
        self.has_key = false;
        self.completed = false;
        log::debug!("progress reset, {gold_total} gold to collect");
    }

    /// What still locks the exit, if anything.
    pub fn blocked_reason(&self) -> Option<String> {
        let gold_missing = self.rules.require_all_gold && self.gold_collected < self.gold_total;
        let key_missing = self.rules.require_key && !self.has_key;
        let (got, total) = (self.gold_collected, self.gold_total);
        match (gold_missing, key_missing) {
            (true, true) => Some(format!("collect all gold ({got}/{total}) and find the key")),
            (true, false) => Some(format!("collect all gold ({got}/{total})")),
            (false, true) => Some("find the key".to_string()),
            (false, false) => None,
        }
    }
}
