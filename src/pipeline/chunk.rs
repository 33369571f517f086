use serde::Serialize;

use crate::feed::NewsEntry;

/// A contiguous run of entries that goes out as one LLM request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryBatch<'a> {
    pub index: usize,
    pub total: usize,
    pub entries: &'a [NewsEntry],
}

/// Split `entries` into `ceil(N / chunk_size)` consecutive batches; only the
/// last one may be short. A zero chunk size is treated as one.
pub fn plan_batches(entries: &[NewsEntry], chunk_size: usize) -> Vec<EntryBatch<'_>> {
    let size = chunk_size.max(1);
    let total = batch_count(entries.len(), size);
    entries
        .chunks(size)
        .enumerate()
        .map(|(index, entries)| EntryBatch { index, total, entries })
        .collect()
}

pub fn batch_count(entries: usize, chunk_size: usize) -> usize {
    entries.div_ceil(chunk_size.max(1))
}

/// What a dry run reports: how the entry list would be split.
#[derive(Debug, Serialize)]
pub struct BatchPlan {
    pub entries: usize,
    pub chunk_size: usize,
    pub batch_sizes: Vec<usize>,
}

impl BatchPlan {
    pub fn from_batches(entries: usize, chunk_size: usize, batches: &[EntryBatch<'_>]) -> Self {
        Self { entries, chunk_size, batch_sizes: batches.iter().map(|b| b.entries.len()).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fixtures::entries;

    #[test]
    fn sixty_entries_in_chunks_of_twenty_five() {
        let list = entries(60);
        let batches = plan_batches(&list, 25);
        let sizes: Vec<usize> = batches.iter().map(|b| b.entries.len()).collect();
        assert_eq!(sizes, vec![25, 25, 10]);
        assert!(batches.iter().all(|b| b.total == 3));
        assert_eq!(batches[1].entries[0], list[25]);
        assert_eq!(batches[2].entries[9], list[59]);
    }

    #[test]
    fn partitions_without_gaps_or_overlap() {
        for n in 0..=80usize {
            let list = entries(n);
            for c in 1..=30usize {
                let batches = plan_batches(&list, c);
                assert_eq!(batches.len(), n.div_ceil(c), "n={n} c={c}");

                let rejoined: Vec<NewsEntry> = batches.iter().flat_map(|b| b.entries.iter().cloned()).collect();
                assert_eq!(rejoined, list, "n={n} c={c}");

                for (i, b) in batches.iter().enumerate() {
                    assert_eq!(b.index, i);
                    assert!(!b.entries.is_empty() && b.entries.len() <= c);
                    assert_eq!(b.entries[0], list[i * c]);
                }
                if let Some(last) = batches.last() {
                    let expected = if n % c == 0 { c } else { n % c };
                    assert_eq!(last.entries.len(), expected, "n={n} c={c}");
                }
            }
        }
    }

    #[test]
    fn replanning_is_deterministic() {
        let list = entries(37);
        assert_eq!(plan_batches(&list, 8), plan_batches(&list, 8));
    }

    #[test]
    fn empty_list_has_no_batches() {
        assert!(plan_batches(&[], 25).is_empty());
        assert_eq!(batch_count(0, 25), 0);
    }

    #[test]
    fn unbounded_chunk_size_is_one_batch() {
        let list = entries(15);
        let batches = plan_batches(&list, usize::MAX);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].entries.len(), 15);
        assert_eq!(batch_count(15, usize::MAX), 1);
    }

    #[test]
    fn batch_plan_lists_sizes() {
        let list = entries(11);
        let batches = plan_batches(&list, 5);
        let plan = BatchPlan::from_batches(list.len(), 5, &batches);
        assert_eq!(plan.batch_sizes, vec![5, 5, 1]);
    }
}
