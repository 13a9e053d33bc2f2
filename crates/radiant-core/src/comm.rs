// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Process Communication
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Sum-reduce and broadcast primitives over arrays of doubles.
//!
//! The medium system merges cell states and radiation-field tables across
//! cooperating processes through this interface. [`SerialComm`] is the
//! single-process implementation; [`LocalGroup`] is a serial reference
//! implementation in which threads stand in for distributed ranks, so the
//! two-phase compute/merge protocol can be exercised without an MPI runtime.
//! Wiring the same trait to rsmpi is a 1:1 swap.

use std::ops::Range;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use radiant_types::error::{RadiantError, RadiantResult};

pub trait ProcessComm: Send + Sync {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    /// Element-wise sum over all ranks; every rank receives the total.
    fn sum_all(&self, data: &mut [f64]) -> RadiantResult<()>;
    /// Distributes `root`'s array to every rank.
    fn broadcast(&self, data: &mut [f64], root: usize) -> RadiantResult<()>;
}

/// Single-process communicator; all collectives are identities.
pub struct SerialComm;

impl ProcessComm for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn sum_all(&self, _data: &mut [f64]) -> RadiantResult<()> {
        Ok(())
    }

    fn broadcast(&self, _data: &mut [f64], root: usize) -> RadiantResult<()> {
        if root != 0 {
            return Err(RadiantError::ConfigError(format!(
                "broadcast root {root} out of range for serial communicator"
            )));
        }
        Ok(())
    }
}

/// Splits `num_items` items across `num_ranks` contiguous blocks as evenly
/// as possible; rank r owns the r-th range.
pub fn balanced_partition(num_items: usize, num_ranks: usize) -> Vec<Range<usize>> {
    let ranks = num_ranks.max(1);
    let base = num_items / ranks;
    let rem = num_items % ranks;
    let mut out = Vec::with_capacity(ranks);
    let mut cursor = 0usize;
    for rank in 0..ranks {
        let count = base + usize::from(rank < rem);
        out.push(cursor..cursor + count);
        cursor += count;
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CollectiveOp {
    Sum,
    Broadcast { root: usize },
}

struct GroupState {
    pending_op: Option<CollectiveOp>,
    staged: Vec<Option<Vec<f64>>>,
    result: Option<Vec<f64>>,
    drained: Vec<bool>,
    pickups: usize,
    failed: Option<String>,
}

/// Shared state of an in-process rank group. Each rank holds a
/// [`LocalGroupComm`] handle and runs on its own thread; collectives block
/// until every rank of the group has entered the same operation.
pub struct LocalGroup {
    size: usize,
    state: Mutex<GroupState>,
    cv: Condvar,
}

impl LocalGroup {
    pub fn new(size: usize) -> RadiantResult<Arc<Self>> {
        if size == 0 {
            return Err(RadiantError::ConfigError(
                "process group requires size >= 1".to_string(),
            ));
        }
        Ok(Arc::new(LocalGroup {
            size,
            state: Mutex::new(GroupState {
                pending_op: None,
                staged: vec![None; size],
                result: None,
                drained: vec![false; size],
                pickups: 0,
                failed: None,
            }),
            cv: Condvar::new(),
        }))
    }

    /// Communicator handle for one rank of the group.
    pub fn comm(self: &Arc<Self>, rank: usize) -> RadiantResult<LocalGroupComm> {
        if rank >= self.size {
            return Err(RadiantError::ConfigError(format!(
                "rank {rank} out of range for group of size {}",
                self.size
            )));
        }
        Ok(LocalGroupComm {
            rank,
            group: Arc::clone(self),
        })
    }

    fn lock(&self) -> RadiantResult<MutexGuard<'_, GroupState>> {
        self.state
            .lock()
            .map_err(|_| RadiantError::Numerical("process group mutex poisoned".to_string()))
    }

    fn fail(&self, st: &mut GroupState, message: String) -> RadiantError {
        st.failed = Some(message.clone());
        self.cv.notify_all();
        RadiantError::Numerical(message)
    }

    fn collective(
        &self,
        rank: usize,
        op: CollectiveOp,
        data: &mut [f64],
    ) -> RadiantResult<()> {
        let mut st = self.lock()?;

        // Wait for the previous round to drain before staging a new one.
        loop {
            if let Some(msg) = &st.failed {
                return Err(RadiantError::Numerical(msg.clone()));
            }
            if st.result.is_none() && st.staged[rank].is_none() {
                break;
            }
            st = self
                .cv
                .wait(st)
                .map_err(|_| RadiantError::Numerical("process group mutex poisoned".to_string()))?;
        }

        if st.pending_op.is_none() {
            st.pending_op = Some(op.clone());
        } else if st.pending_op.as_ref() != Some(&op) {
            let msg = format!(
                "mismatched collectives: {:?} vs {:?}",
                st.pending_op, op
            );
            return Err(self.fail(&mut st, msg));
        }
        st.staged[rank] = Some(data.to_vec());

        if st.staged.iter().all(|s| s.is_some()) {
            let reference_idx = match &op {
                CollectiveOp::Sum => 0,
                CollectiveOp::Broadcast { root } => *root,
            };
            let reference_len = st.staged[reference_idx].as_ref().map_or(0, |v| v.len());
            let mismatched = st
                .staged
                .iter()
                .flatten()
                .find(|staged| staged.len() != reference_len)
                .map(|staged| staged.len());
            if let Some(len) = mismatched {
                let msg = format!("collective length mismatch: {len} vs {reference_len}");
                return Err(self.fail(&mut st, msg));
            }
            let combined = match &op {
                CollectiveOp::Sum => {
                    let mut sum = vec![0.0; reference_len];
                    for staged in st.staged.iter().flatten() {
                        for (acc, v) in sum.iter_mut().zip(staged.iter()) {
                            *acc += *v;
                        }
                    }
                    sum
                }
                CollectiveOp::Broadcast { .. } => {
                    st.staged[reference_idx].clone().unwrap_or_default()
                }
            };
            st.result = Some(combined);
            st.drained = vec![false; self.size];
            st.pickups = self.size;
            st.pending_op = None;
            for slot in st.staged.iter_mut() {
                *slot = None;
            }
            self.cv.notify_all();
        }

        // Wait for the combined result of this round.
        loop {
            if let Some(msg) = &st.failed {
                return Err(RadiantError::Numerical(msg.clone()));
            }
            if st.result.is_some() && !st.drained[rank] {
                break;
            }
            st = self
                .cv
                .wait(st)
                .map_err(|_| RadiantError::Numerical("process group mutex poisoned".to_string()))?;
        }

        let result_len = st.result.as_ref().map_or(0, |v| v.len());
        if result_len != data.len() {
            let msg = format!(
                "collective result length {result_len} does not match buffer {}",
                data.len()
            );
            return Err(self.fail(&mut st, msg));
        }
        if let Some(result) = st.result.as_ref() {
            data.copy_from_slice(result);
        }
        st.drained[rank] = true;
        st.pickups -= 1;
        if st.pickups == 0 {
            st.result = None;
            self.cv.notify_all();
        }
        Ok(())
    }
}

/// Per-rank communicator handle into a [`LocalGroup`].
pub struct LocalGroupComm {
    rank: usize,
    group: Arc<LocalGroup>,
}

impl ProcessComm for LocalGroupComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.group.size
    }

    fn sum_all(&self, data: &mut [f64]) -> RadiantResult<()> {
        self.group.collective(self.rank, CollectiveOp::Sum, data)
    }

    fn broadcast(&self, data: &mut [f64], root: usize) -> RadiantResult<()> {
        if root >= self.group.size {
            return Err(RadiantError::ConfigError(format!(
                "broadcast root {root} out of range for group of size {}",
                self.group.size
            )));
        }
        self.group
            .collective(self.rank, CollectiveOp::Broadcast { root }, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_balanced_partition_covers_all_items() {
        let ranges = balanced_partition(17, 4);
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0], 0..5);
        assert_eq!(ranges[3].end, 17);
        let covered: usize = ranges.iter().map(|r| r.len()).sum();
        assert_eq!(covered, 17);
    }

    #[test]
    fn test_serial_comm_identity() {
        let comm = SerialComm;
        let mut data = vec![1.0, 2.0, 3.0];
        comm.sum_all(&mut data).expect("sum_all");
        assert_eq!(data, vec![1.0, 2.0, 3.0]);
        comm.broadcast(&mut data, 0).expect("broadcast");
        assert!(comm.broadcast(&mut data, 1).is_err());
    }

    #[test]
    fn test_local_group_sum_all() {
        let group = LocalGroup::new(3).expect("group");
        let mut handles = Vec::new();
        for rank in 0..3 {
            let comm = group.comm(rank).expect("comm");
            handles.push(thread::spawn(move || {
                let mut data = vec![rank as f64, 10.0 * (rank + 1) as f64];
                comm.sum_all(&mut data).expect("sum_all");
                data
            }));
        }
        for handle in handles {
            let data = handle.join().expect("thread");
            assert_eq!(data, vec![3.0, 60.0]);
        }
    }

    #[test]
    fn test_local_group_repeated_rounds() {
        let group = LocalGroup::new(2).expect("group");
        let mut handles = Vec::new();
        for rank in 0..2 {
            let comm = group.comm(rank).expect("comm");
            handles.push(thread::spawn(move || {
                let mut totals = Vec::new();
                for round in 0..5 {
                    let mut data = vec![(rank + round) as f64];
                    comm.sum_all(&mut data).expect("sum_all");
                    totals.push(data[0]);
                }
                totals
            }));
        }
        for handle in handles {
            let totals = handle.join().expect("thread");
            assert_eq!(totals, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
        }
    }

    #[test]
    fn test_local_group_broadcast() {
        let group = LocalGroup::new(3).expect("group");
        let mut handles = Vec::new();
        for rank in 0..3 {
            let comm = group.comm(rank).expect("comm");
            handles.push(thread::spawn(move || {
                let mut data = if rank == 1 {
                    vec![7.0, 8.0]
                } else {
                    vec![0.0, 0.0]
                };
                comm.broadcast(&mut data, 1).expect("broadcast");
                data
            }));
        }
        for handle in handles {
            assert_eq!(handle.join().expect("thread"), vec![7.0, 8.0]);
        }
    }

    #[test]
    fn test_local_group_rejects_bad_rank() {
        let group = LocalGroup::new(2).expect("group");
        assert!(group.comm(2).is_err());
        let comm = group.comm(0).expect("comm");
        assert!(comm.broadcast(&mut [0.0], 5).is_err());
    }
}
