use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Mutex;

// Randomness is consumed through this trait so replica placement and fault
// injection stay deterministic under test.
pub trait ShardSelector: Send + Sync {
    // K distinct indices out of 0..n, k <= n.
    fn pick_distinct(&self, n: usize, k: usize) -> Vec<usize>;

    // One index out of 0..n.
    fn pick_one(&self, n: usize) -> usize;
}

// Uniform selection backed by the thread-local rng.
#[derive(Debug, Default)]
pub struct RandomSelector;

impl ShardSelector for RandomSelector {
    fn pick_distinct(&self, n: usize, k: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rand::thread_rng());
        indices.truncate(k);
        indices
    }

    fn pick_one(&self, n: usize) -> usize {
        rand::thread_rng().gen_range(0..n)
    }
}

// Replays a scripted sequence of picks, then falls back to the lowest
// indices. Lets tests pin every record to a known shard.
#[derive(Debug, Default)]
pub struct ScriptedSelector {
    script: Mutex<Vec<Vec<usize>>>,
}

impl ScriptedSelector {
    pub fn new(mut picks: Vec<Vec<usize>>) -> Self {
        picks.reverse();
        Self {
            script: Mutex::new(picks),
        }
    }
}

impl ShardSelector for ScriptedSelector {
    fn pick_distinct(&self, n: usize, k: usize) -> Vec<usize> {
        let mut script = self.script.lock().expect("selector script poisoned");
        match script.pop() {
            Some(pick) => pick,
            None => (0..n).take(k).collect(),
        }
    }

    fn pick_one(&self, n: usize) -> usize {
        self.pick_distinct(n, 1).first().copied().unwrap_or(0)
    }
}
