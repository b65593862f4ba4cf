use tracing::trace;

use super::{ResultCollector, RetrieveOptions};
use crate::ids::EntryId;
use crate::scanner::{sort_scanners, FieldScanner};

/// k-of-n skip merge over one size bucket
///
/// A conjunction of size `k` matches when `k` scanners stand on it with no exclude
/// entry among them. After sorting, the first scanner holds the smallest entry and the
/// k-th tells whether `k` scanners agree on it; when they don't, every scanner in front
/// of the k-th may jump straight to the k-th's entry.
pub fn retrieve_k(
    scanners: &mut [FieldScanner<'_>],
    k: usize,
    collector: &mut dyn ResultCollector,
    options: &RetrieveOptions,
) {
    let k = k.max(1);
    if scanners.len() < k {
        return;
    }

    let mut step = 0usize;
    loop {
        sort_scanners(scanners);
        let eid = scanners[0].current();
        let end = scanners[k - 1].current();
        if eid.is_null() || end.is_null() {
            return;
        }

        let conj = eid.conjunction();
        let next = if end.conjunction() == conj {
            let next = EntryId::new(conj.successor(), false);
            if eid.is_include() {
                if options.dump_steps {
                    trace!(step, k, conj = %conj, "Conjunction matched");
                }
                collector.add(conj.doc_id(), conj.index());
            } else {
                if options.dump_steps {
                    trace!(step, k, conj = %conj, field = scanners[0].field(), "Conjunction excluded");
                }
                for scanner in scanners[k..].iter_mut() {
                    if scanner.current().conjunction() != conj {
                        break;
                    }
                    scanner.skip_to(next);
                }
            }
            next
        } else {
            if options.dump_steps {
                trace!(step, k, from = ?eid, to = ?end, "Skipping to k-th entry");
            }
            end
        };

        for scanner in scanners[..k].iter_mut() {
            scanner.skip_to(next);
        }
        step += 1;
    }
}

/// Merge over one holder set where each conjunction carries its own threshold
///
/// The threshold of the smallest current conjunction is its size (at least 1). Every
/// scanner standing on that conjunction is moved past it before the next step, so a
/// small conjunction is never skipped on behalf of a larger one.
pub fn retrieve_dynamic(
    scanners: &mut [FieldScanner<'_>],
    collector: &mut dyn ResultCollector,
    options: &RetrieveOptions,
) {
    let mut step = 0usize;
    loop {
        sort_scanners(scanners);
        let Some(eid) = scanners.first().map(FieldScanner::current) else {
            return;
        };
        if eid.is_null() {
            return;
        }

        let conj = eid.conjunction();
        let k = (conj.size() as usize).max(1);
        let matched = eid.is_include()
            && scanners.len() >= k
            && scanners[k - 1].current().conjunction() == conj;
        if matched {
            collector.add(conj.doc_id(), conj.index());
        }
        if options.dump_steps {
            trace!(step, k, conj = %conj, matched, "Evaluated conjunction");
        }

        let next = EntryId::new(conj.successor(), false);
        for scanner in scanners.iter_mut() {
            if scanner.current().conjunction() != conj {
                break;
            }
            scanner.skip_to(next);
        }
        step += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::{MatchedEntries, TermRef};
    use crate::ids::ConjunctionId;
    use crate::retrieve::DocIdCollector;

    fn inc(doc: u32, size: usize) -> EntryId {
        EntryId::new(ConjunctionId::new(doc, 0, size).unwrap(), true)
    }

    fn exc(doc: u32, size: usize) -> EntryId {
        EntryId::new(ConjunctionId::new(doc, 0, size).unwrap(), false)
    }

    fn scanner<'a>(name: &'a str, lists: &'a [Vec<EntryId>]) -> FieldScanner<'a> {
        FieldScanner::new(
            name,
            lists
                .iter()
                .map(|l| MatchedEntries::new(TermRef::Wildcard, l))
                .collect(),
        )
    }

    #[test]
    fn test_retrieve_k_requires_k_fields() {
        // size-2 conjunctions: doc 1 on (a, b), doc 2 on (a, c), doc 3 on (b, c)
        let a = vec![vec![inc(1, 2), inc(2, 2)]];
        let b = vec![vec![inc(1, 2), inc(3, 2)]];
        let mut scanners = vec![scanner("a", &a), scanner("b", &b)];

        let mut collector = DocIdCollector::new();
        retrieve_k(&mut scanners, 2, &mut collector, &RetrieveOptions::default());
        assert_eq!(collector.doc_ids(), vec![1]);
    }

    #[test]
    fn test_retrieve_k_exclusion() {
        // size-1: doc 1 a∈, b∉ ; doc 2 a∈
        let a = vec![vec![inc(1, 1), inc(2, 1)]];
        let b = vec![vec![exc(1, 1)]];
        let mut scanners = vec![scanner("a", &a), scanner("b", &b)];

        let mut collector = DocIdCollector::new();
        retrieve_k(&mut scanners, 1, &mut collector, &RetrieveOptions::default());
        assert_eq!(collector.doc_ids(), vec![2]);
    }

    #[test]
    fn test_retrieve_k_zero_uses_wildcard() {
        let wildcard = vec![vec![inc(1, 0), inc(2, 0), inc(3, 0)]];
        let tag = vec![vec![exc(2, 0)]];
        let mut scanners = vec![scanner("tag", &tag), scanner("wildcard", &wildcard)];

        let mut collector = DocIdCollector::new();
        retrieve_k(&mut scanners, 0, &mut collector, &RetrieveOptions::default());
        assert_eq!(collector.doc_ids(), vec![1, 3]);
    }

    #[test]
    fn test_retrieve_dynamic_mixed_sizes() {
        // doc 1: size 2 on (a, b); doc 2: size 1 on a; doc 3: size 2 on (a, c) with c absent
        let a = vec![vec![inc(1, 2), inc(2, 1), inc(3, 2)]];
        let b = vec![vec![inc(1, 2)]];
        let mut scanners = vec![scanner("a", &a), scanner("b", &b)];

        let mut collector = DocIdCollector::new();
        retrieve_dynamic(&mut scanners, &mut collector, &RetrieveOptions::default());
        assert_eq!(collector.doc_ids(), vec![1, 2]);
    }

    #[test]
    fn test_retrieve_dynamic_exclusion_and_wildcard() {
        let wildcard = vec![vec![inc(1, 0), inc(2, 0)]];
        let a = vec![vec![exc(1, 0), exc(3, 1), inc(3, 1)]];
        let mut scanners = vec![scanner("a", &a), scanner("wildcard", &wildcard)];

        let mut collector = DocIdCollector::new();
        retrieve_dynamic(&mut scanners, &mut collector, &RetrieveOptions::default());
        assert_eq!(collector.doc_ids(), vec![2]);
    }
}
