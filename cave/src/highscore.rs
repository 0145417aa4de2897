use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in one highscore table.
pub const HIGHSCORE_SIZE: usize = 20;

#[derive(Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct HighScore {
    pub name: String,
    pub score: i32,
}

/// A bounded highscore table kept sorted by descending score.
#[derive(Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct HighScoreTable(Vec<HighScore>);

impl HighScoreTable {
    /// Would the given score make it onto the table?
    pub fn is_highscore(&self, score: i32) -> bool {
        score > 0
            && (self.0.len() < HIGHSCORE_SIZE
                || score > self.0[self.0.len() - 1].score)
    }

    /// Insert a score, keeping the table sorted and bounded.
    ///
    /// Returns the zero-based rank of the new entry, or `None` if the score
    /// did not qualify.
    pub fn add(&mut self, name: impl Into<String>, score: i32) -> Option<usize> {
        if !self.is_highscore(score) {
            return None;
        }

        // Insert after equal scores so earlier entries keep their rank.
        let rank = self.0.partition_point(|e| e.score >= score);
        self.0.insert(
            rank,
            HighScore {
                name: name.into(),
                score,
            },
        );
        self.0.truncate(HIGHSCORE_SIZE);
        Some(rank)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HighScore> + '_ {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
