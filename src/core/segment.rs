//! Trajectory segments and padded training batches.
//!
//! A [`TrajectorySegment`] is one episode fragment collected by the rollout
//! layer: per-timestep observation, next-observation, action, reward, done
//! flag, the value estimate computed at collection time, and the recurrent
//! state snapshots produced by the forward pass at that timestep (keyed by
//! layer index: 0 = hidden, 1 = cell). The segment is consumed exactly once
//! by the advantage post-processor, which appends advantage and value-target
//! columns in place.
//!
//! The recorded state snapshots are what make truncated-trajectory
//! bootstrapping correct: the post-processor replays the exact final state
//! instead of re-deriving it.
//!
//! A [`TrainBatch`] is the padded, flattened view the loss consumes. For
//! recurrent training, rows are laid out sequence-major: row `s * max_len + t`
//! holds sequence `s` at timestep `t`, with zero padding past each sequence's
//! true length and `seq_lens` recording the true lengths.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// One collected episode fragment, augmented in place by the post-processor.
#[derive(Debug, Clone, Default)]
pub struct TrajectorySegment {
    /// Observation shape (height, width, channels).
    pub obs_shape: (usize, usize, usize),

    obs: Vec<Vec<f32>>,
    next_obs: Vec<Vec<f32>>,
    actions: Vec<u32>,
    rewards: Vec<f32>,
    dones: Vec<bool>,
    values: Vec<f32>,
    state_out_h: Vec<Vec<f32>>,
    state_out_c: Vec<Vec<f32>>,

    /// Per-timestep advantages (empty until post-processed).
    pub advantages: Vec<f32>,
    /// Per-timestep value targets (empty until post-processed).
    pub value_targets: Vec<f32>,
}

impl TrajectorySegment {
    /// Create an empty segment for observations of the given shape.
    pub fn new(obs_shape: (usize, usize, usize)) -> Self {
        Self {
            obs_shape,
            ..Default::default()
        }
    }

    /// Append one timestep.
    ///
    /// `state_h`/`state_c` are the recurrent state produced by the forward
    /// pass at this timestep (layer traces 0 and 1).
    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        obs: Vec<f32>,
        next_obs: Vec<f32>,
        action: u32,
        reward: f32,
        done: bool,
        value: f32,
        state_h: Vec<f32>,
        state_c: Vec<f32>,
    ) {
        let (h, w, c) = self.obs_shape;
        let expected = h * w * c;
        assert_eq!(obs.len(), expected, "obs length does not match obs_shape");
        assert_eq!(
            next_obs.len(),
            expected,
            "next_obs length does not match obs_shape"
        );
        assert_eq!(
            state_h.len(),
            state_c.len(),
            "state snapshots must have matching widths"
        );

        self.obs.push(obs);
        self.next_obs.push(next_obs);
        self.actions.push(action);
        self.rewards.push(reward);
        self.dones.push(done);
        self.values.push(value);
        self.state_out_h.push(state_h);
        self.state_out_c.push(state_c);
    }

    /// Number of timesteps.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the segment holds no timesteps.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Done flag of the last timestep. Panics on an empty segment.
    pub fn last_done(&self) -> bool {
        *self.dones.last().expect("segment is empty")
    }

    /// Next-observation of the last timestep. Panics on an empty segment.
    pub fn last_next_obs(&self) -> &[f32] {
        self.next_obs.last().expect("segment is empty")
    }

    /// Final recorded recurrent state, flattened hidden-then-cell
    /// (the [`HiddenState::from_vec`](crate::core::recurrent::HiddenState::from_vec)
    /// layout). Panics on an empty segment.
    pub fn last_state_vec(&self) -> Vec<f32> {
        let h = self.state_out_h.last().expect("segment is empty");
        let c = self.state_out_c.last().expect("segment is empty");
        let mut out = h.clone();
        out.extend_from_slice(c);
        out
    }

    /// Recorded state trace for the given layer index (0 = hidden, 1 = cell).
    pub fn state_out(&self, layer: usize) -> &[Vec<f32>] {
        match layer {
            0 => &self.state_out_h,
            1 => &self.state_out_c,
            _ => panic!("state layer index out of range: {}", layer),
        }
    }

    /// Per-timestep rewards.
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// Per-timestep value estimates recorded at collection time.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Per-timestep done flags.
    pub fn dones(&self) -> &[bool] {
        &self.dones
    }

    /// Per-timestep actions.
    pub fn actions(&self) -> &[u32] {
        &self.actions
    }

    /// Attach post-processed advantage and value-target columns.
    pub fn attach(&mut self, advantages: Vec<f32>, value_targets: Vec<f32>) {
        assert_eq!(advantages.len(), self.len(), "advantage column length mismatch");
        assert_eq!(
            value_targets.len(),
            self.len(),
            "value target column length mismatch"
        );
        self.advantages = advantages;
        self.value_targets = value_targets;
    }

    /// Whether the post-processor has attached advantages.
    pub fn is_postprocessed(&self) -> bool {
        self.advantages.len() == self.len() && !self.is_empty()
    }

    /// Build a single-sequence training batch from this segment.
    ///
    /// Panics if the segment has not been post-processed.
    pub fn to_train_batch(&self) -> TrainBatch {
        assert!(
            self.is_postprocessed(),
            "segment must be post-processed before batching"
        );

        let obs = self.obs.iter().flatten().copied().collect();
        TrainBatch {
            obs,
            obs_shape: self.obs_shape,
            actions: self.actions.clone(),
            rewards: self.rewards.clone(),
            advantages: self.advantages.clone(),
            value_targets: self.value_targets.clone(),
            seq_lens: Some(vec![self.len()]),
            state_in: None,
        }
    }
}

/// Padded training batch consumed by the loss.
///
/// For recurrent policies `seq_lens` is present and rows are padded
/// sequence-major to `max_seq_len()`; for non-recurrent batches it is `None`
/// and every row is valid.
#[derive(Debug, Clone)]
pub struct TrainBatch {
    /// Flattened observations: `rows * h * w * c` floats.
    pub obs: Vec<f32>,
    /// Observation shape (height, width, channels).
    pub obs_shape: (usize, usize, usize),
    /// Action taken per row.
    pub actions: Vec<u32>,
    /// Reward per row.
    pub rewards: Vec<f32>,
    /// Advantage per row (from the post-processor).
    pub advantages: Vec<f32>,
    /// Value target per row (from the post-processor).
    pub value_targets: Vec<f32>,
    /// True sequence lengths when the policy is recurrent.
    pub seq_lens: Option<Vec<usize>>,
    /// Initial recurrent state per sequence, flattened hidden-then-cell.
    /// `None` means every sequence starts an episode (zero state).
    pub state_in: Option<Vec<Vec<f32>>>,
}

impl TrainBatch {
    /// Number of rows (padded elements for recurrent batches).
    pub fn rows(&self) -> usize {
        self.actions.len()
    }

    /// Longest sequence in the batch (1 for non-recurrent batches).
    pub fn max_seq_len(&self) -> usize {
        match &self.seq_lens {
            Some(lens) => lens.iter().copied().max().unwrap_or(0),
            None => 1,
        }
    }

    /// Check internal consistency. Any mismatch is a fatal integration
    /// error, surfaced immediately rather than masked.
    pub fn validate(&self) {
        let rows = self.rows();
        let (h, w, c) = self.obs_shape;
        assert_eq!(self.obs.len(), rows * h * w * c, "obs column length mismatch");
        assert_eq!(self.rewards.len(), rows, "rewards column length mismatch");
        assert_eq!(self.advantages.len(), rows, "advantages column length mismatch");
        assert_eq!(
            self.value_targets.len(),
            rows,
            "value_targets column length mismatch"
        );
        if let Some(lens) = &self.seq_lens {
            assert!(!lens.is_empty(), "seq_lens present but empty");
            let max_len = self.max_seq_len();
            assert_eq!(
                lens.len() * max_len,
                rows,
                "rows ({}) must equal n_seqs ({}) * max_seq_len ({})",
                rows,
                lens.len(),
                max_len
            );
        }
        if let Some(states) = &self.state_in {
            let n_seqs = self.seq_lens.as_ref().map(|l| l.len()).unwrap_or(rows);
            assert_eq!(
                states.len(),
                n_seqs,
                "state_in must hold one state per sequence"
            );
        }
    }

    /// Initial recurrent state for the batch, stacked across sequences.
    ///
    /// Returns `None` when the batch carries no recorded initial state
    /// (sequences start from the zero state).
    pub fn initial_state<B: Backend>(
        &self,
        hidden_size: usize,
        device: &B::Device,
    ) -> Option<crate::core::recurrent::HiddenState<B>> {
        let states = self.state_in.as_ref()?;

        let mut h_flat = Vec::with_capacity(states.len() * hidden_size);
        let mut c_flat = Vec::with_capacity(states.len() * hidden_size);
        for state in states {
            assert_eq!(
                state.len(),
                2 * hidden_size,
                "state_in entry length does not match hidden size"
            );
            h_flat.extend_from_slice(&state[..hidden_size]);
            c_flat.extend_from_slice(&state[hidden_size..]);
        }

        let n = states.len();
        let hidden: Tensor<B, 2> =
            Tensor::<B, 1>::from_floats(h_flat.as_slice(), device).reshape([n, hidden_size]);
        let cell: Tensor<B, 2> =
            Tensor::<B, 1>::from_floats(c_flat.as_slice(), device).reshape([n, hidden_size]);
        Some(crate::core::recurrent::HiddenState::new(hidden, cell))
    }

    /// Observations as a `[rows, h, w, c]` tensor.
    pub fn obs_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 4> {
        let (h, w, c) = self.obs_shape;
        Tensor::<B, 1>::from_floats(self.obs.as_slice(), device)
            .reshape([self.rows(), h, w, c])
    }
}

/// Element-wise validity mask for padded sequences.
///
/// Returns a flat sequence-major mask of length `seq_lens.len() * max_len`:
/// 1.0 where `t < seq_lens[s]`, 0.0 in the padding.
pub fn sequence_mask(seq_lens: &[usize], max_len: usize) -> Vec<f32> {
    let mut mask = vec![0.0f32; seq_lens.len() * max_len];
    for (s, &len) in seq_lens.iter().enumerate() {
        debug_assert!(len <= max_len, "seq_len {} exceeds max_len {}", len, max_len);
        for t in 0..len.min(max_len) {
            mask[s * max_len + t] = 1.0;
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(v: f32) -> Vec<f32> {
        vec![v; 2 * 2 * 4]
    }

    fn push_step(seg: &mut TrajectorySegment, reward: f32, done: bool) {
        seg.push(obs(0.0), obs(1.0), 1, reward, done, 0.5, vec![0.1; 4], vec![0.2; 4]);
    }

    #[test]
    fn test_segment_push_and_accessors() {
        let mut seg = TrajectorySegment::new((2, 2, 4));
        push_step(&mut seg, 1.0, false);
        push_step(&mut seg, 2.0, true);

        assert_eq!(seg.len(), 2);
        assert!(seg.last_done());
        assert_eq!(seg.rewards(), &[1.0, 2.0]);
        assert_eq!(seg.values(), &[0.5, 0.5]);
        assert_eq!(seg.actions(), &[1, 1]);
        assert_eq!(seg.state_out(0).len(), 2);
        assert_eq!(seg.state_out(1).len(), 2);
    }

    #[test]
    fn test_last_state_vec_layout() {
        let mut seg = TrajectorySegment::new((2, 2, 4));
        seg.push(
            obs(0.0),
            obs(1.0),
            0,
            1.0,
            false,
            0.0,
            vec![1.0, 2.0],
            vec![3.0, 4.0],
        );

        // Hidden first, then cell: the HiddenState::from_vec layout.
        assert_eq!(seg.last_state_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    #[should_panic(expected = "obs length")]
    fn test_push_wrong_obs_shape() {
        let mut seg = TrajectorySegment::new((2, 2, 4));
        seg.push(vec![0.0; 3], obs(1.0), 0, 1.0, false, 0.0, vec![], vec![]);
    }

    #[test]
    fn test_attach_and_batch() {
        let mut seg = TrajectorySegment::new((2, 2, 4));
        push_step(&mut seg, 1.0, false);
        push_step(&mut seg, 2.0, false);
        seg.attach(vec![0.5, 0.25], vec![1.5, 1.25]);

        assert!(seg.is_postprocessed());

        let batch = seg.to_train_batch();
        batch.validate();
        assert_eq!(batch.rows(), 2);
        assert_eq!(batch.seq_lens, Some(vec![2]));
        assert_eq!(batch.advantages, vec![0.5, 0.25]);
    }

    #[test]
    #[should_panic(expected = "post-processed")]
    fn test_batch_before_postprocess() {
        let mut seg = TrajectorySegment::new((2, 2, 4));
        push_step(&mut seg, 1.0, false);
        let _ = seg.to_train_batch();
    }

    #[test]
    fn test_sequence_mask() {
        // Two sequences of lengths 3 and 1 padded to 3.
        let mask = sequence_mask(&[3, 1], 3);
        assert_eq!(mask, vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_initial_state_stacking() {
        use burn::backend::NdArray;
        type B = NdArray<f32>;

        let device = Default::default();
        let batch = TrainBatch {
            obs: vec![0.0; 4 * 2 * 2 * 4],
            obs_shape: (2, 2, 4),
            actions: vec![0; 4],
            rewards: vec![0.0; 4],
            advantages: vec![0.0; 4],
            value_targets: vec![0.0; 4],
            seq_lens: Some(vec![2, 2]),
            state_in: Some(vec![
                vec![1.0, 2.0, 3.0, 4.0], // seq 0: h = [1, 2], c = [3, 4]
                vec![5.0, 6.0, 7.0, 8.0], // seq 1: h = [5, 6], c = [7, 8]
            ]),
        };
        batch.validate();

        let state = batch.initial_state::<B>(2, &device).expect("state expected");
        assert_eq!(state.batch(), 2);
        assert_eq!(state.size(), 2);
        // to_vec is hidden-then-cell across the stacked batch
        assert_eq!(state.to_vec(), vec![1.0, 2.0, 5.0, 6.0, 3.0, 4.0, 7.0, 8.0]);
    }

    #[test]
    fn test_batch_validate_detects_bad_rows() {
        let batch = TrainBatch {
            obs: vec![0.0; 2 * 2 * 2 * 4],
            obs_shape: (2, 2, 4),
            actions: vec![0, 1],
            rewards: vec![1.0, 1.0],
            advantages: vec![0.0, 0.0],
            value_targets: vec![0.0, 0.0],
            seq_lens: Some(vec![2, 1]), // 2 seqs * max_len 2 = 4 != 2 rows
            state_in: None,
        };
        let result = std::panic::catch_unwind(|| batch.validate());
        assert!(result.is_err());
    }
}
