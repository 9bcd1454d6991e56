use std::cmp::Ordering;
use std::collections::VecDeque;

// Per-shard slice descriptor produced by window discovery and consumed by page
// assembly: skip that many of the shard's candidate rows, then keep that many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultWindow {
    skip: usize,
    keep: usize,
}

impl ResultWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump_skip(&mut self) -> usize {
        self.skip += 1;
        self.skip
    }

    pub fn bump_keep(&mut self) -> usize {
        self.keep += 1;
        self.keep
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    // Total rows the merge consumed from this queue.
    pub fn span(&self) -> usize {
        self.skip + self.keep
    }
}

// Per-step bookkeeping plugged into `k_way_merge`. `update` is called exactly
// once per merge step, with the indices of every queue advanced at that step.
pub trait MergeStrategy<T> {
    fn update(&mut self, element: &T, advanced: &[usize]);
    fn done(&self) -> bool;
}

// K-way merge over queues that are each sorted ascending under `cmp`.
//
// One step selects the minimum head and advances *every* queue whose head
// compares equal to it, so replicas of the same record on different shards
// collapse into a single logical element. Requires `cmp` to be a total order
// that discriminates distinct records; two different records that tie would
// also be collapsed.
pub fn k_way_merge<T, C, S>(queues: &mut [VecDeque<T>], cmp: C, strategy: &mut S)
where
    T: Clone,
    C: Fn(&T, &T) -> Ordering,
    S: MergeStrategy<T>,
{
    let mut advanced = Vec::with_capacity(queues.len());

    while !strategy.done() {
        let best = match queues
            .iter()
            .filter_map(|queue| queue.front())
            .min_by(|a, b| cmp(*a, *b))
        {
            Some(head) => head.clone(),
            None => break,
        };

        advanced.clear();
        for (index, queue) in queues.iter_mut().enumerate() {
            let ties = queue
                .front()
                .map_or(false, |head| cmp(head, &best) == Ordering::Equal);
            if ties {
                queue.pop_front();
                advanced.push(index);
            }
        }

        strategy.update(&best, &advanced);
    }
}

// Phase 1: walk the global order without materializing it, counting for each
// queue how many of its rows land before the page (skip) and inside it (keep).
pub struct WindowDiscovery {
    windows: Vec<ResultWindow>,
    rank: usize,
    from: usize,
    up_to: usize,
}

impl WindowDiscovery {
    pub fn new(queue_count: usize, from: usize, up_to: usize) -> Self {
        Self {
            windows: vec![ResultWindow::new(); queue_count],
            rank: 0,
            from,
            up_to,
        }
    }

    pub fn into_windows(self) -> Vec<ResultWindow> {
        self.windows
    }
}

impl<T> MergeStrategy<T> for WindowDiscovery {
    fn update(&mut self, _element: &T, advanced: &[usize]) {
        self.rank += 1;
        for &index in advanced {
            if self.rank <= self.from {
                self.windows[index].bump_skip();
            } else {
                self.windows[index].bump_keep();
            }
        }
    }

    fn done(&self) -> bool {
        self.rank >= self.up_to
    }
}

// Phase 2: accumulate the page itself from the pre-trimmed windows.
pub struct PageAssembly<T> {
    page: Vec<T>,
    up_to: usize,
}

impl<T> PageAssembly<T> {
    pub fn new(up_to: usize) -> Self {
        Self {
            page: Vec::with_capacity(up_to),
            up_to,
        }
    }

    pub fn into_page(self) -> Vec<T> {
        self.page
    }
}

impl<T: Clone> MergeStrategy<T> for PageAssembly<T> {
    fn update(&mut self, element: &T, _advanced: &[usize]) {
        self.page.push(element.clone());
    }

    fn done(&self) -> bool {
        self.page.len() >= self.up_to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queues(raw: &[&[i32]]) -> Vec<VecDeque<i32>> {
        raw.iter().map(|q| q.iter().copied().collect()).collect()
    }

    #[test]
    fn test_page_assembly_merges_in_order() {
        let mut queues = queues(&[&[1, 4, 7], &[2, 5, 8], &[3, 6, 9]]);
        let mut assembly = PageAssembly::new(5);

        k_way_merge(&mut queues, i32::cmp, &mut assembly);

        assert_eq!(assembly.into_page(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_page_assembly_exhausts_short_queues() {
        let mut queues = queues(&[&[1], &[2], &[]]);
        let mut assembly = PageAssembly::new(10);

        k_way_merge(&mut queues, i32::cmp, &mut assembly);

        assert_eq!(assembly.into_page(), vec![1, 2]);
    }

    #[test]
    fn test_tie_dedup_advances_all_equal_heads() {
        // 4 appears at the head of two queues at the same step: one merge
        // step must advance both and emit a single element.
        let mut queues = queues(&[&[1, 4], &[4, 9]]);
        let mut assembly = PageAssembly::new(10);

        k_way_merge(&mut queues, i32::cmp, &mut assembly);

        assert_eq!(assembly.into_page(), vec![1, 4, 9]);
    }

    #[test]
    fn test_window_discovery_splits_skip_and_keep() {
        // Page 1 of size 2 over global order [1..6]: ranks 1-2 are skip
        // territory, ranks 3-4 are the page.
        let mut queues = queues(&[&[1, 4, 6], &[2, 3, 5]]);
        let mut discovery = WindowDiscovery::new(2, 2, 4);

        k_way_merge(&mut queues, i32::cmp, &mut discovery);
        let windows = discovery.into_windows();

        assert_eq!(windows[0].skip(), 1); // 1
        assert_eq!(windows[0].keep(), 1); // 4
        assert_eq!(windows[1].skip(), 1); // 2
        assert_eq!(windows[1].keep(), 1); // 3
    }

    #[test]
    fn test_window_discovery_counts_ties_as_one_rank() {
        let mut queues = queues(&[&[1, 3], &[1, 2]]);
        let mut discovery = WindowDiscovery::new(2, 0, 2);

        k_way_merge(&mut queues, i32::cmp, &mut discovery);
        let windows = discovery.into_windows();

        // Rank 1 is the tied pair of 1s, rank 2 is the 2; the 3 is never
        // consumed.
        assert_eq!(windows[0].skip(), 0);
        assert_eq!(windows[0].keep(), 1);
        assert_eq!(windows[1].skip(), 0);
        assert_eq!(windows[1].keep(), 2);
    }

    #[test]
    fn test_window_completeness() {
        let data: Vec<Vec<i32>> = vec![vec![1, 5, 9, 13], vec![2, 6, 10], vec![3, 7, 11, 15]];
        let total: usize = data.iter().map(Vec::len).sum();

        for (from, up_to) in [(0, 4), (4, 8), (8, 12), (12, 16)] {
            let mut queues: Vec<VecDeque<i32>> =
                data.iter().map(|q| q.iter().copied().collect()).collect();
            let mut discovery = WindowDiscovery::new(queues.len(), from, up_to);
            k_way_merge(&mut queues, i32::cmp, &mut discovery);
            let windows = discovery.into_windows();

            // Consumed rows per queue equal that queue's skip+keep.
            for (index, queue) in queues.iter().enumerate() {
                assert_eq!(windows[index].span(), data[index].len() - queue.len());
            }

            // Total kept rows equal the page size, clamped at the tail.
            let kept: usize = windows.iter().map(ResultWindow::keep).sum();
            assert_eq!(kept, (up_to - from).min(total.saturating_sub(from)));
        }
    }

    #[test]
    fn test_zero_up_to_is_empty() {
        let mut assembly_queues = queues(&[&[1, 2, 3]]);
        let mut assembly = PageAssembly::new(0);
        k_way_merge(&mut assembly_queues, i32::cmp, &mut assembly);
        assert!(assembly.into_page().is_empty());

        let mut discovery_queues = queues(&[&[1, 2, 3]]);
        let mut discovery = WindowDiscovery::new(1, 0, 0);
        k_way_merge(&mut discovery_queues, i32::cmp, &mut discovery);
        assert_eq!(discovery.into_windows()[0], ResultWindow::new());
    }

    #[test]
    fn test_window_increments_return_new_value() {
        let mut window = ResultWindow::new();

        assert_eq!(window.bump_skip(), 1);
        assert_eq!(window.bump_skip(), 2);
        assert_eq!(window.bump_keep(), 1);
        assert_eq!(window.span(), 3);
    }
}
