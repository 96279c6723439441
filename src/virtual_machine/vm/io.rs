use std::collections::VecDeque;

/// Input and output queues of a single VM.
///
/// Input is consumed in arrival order. Output is append-only until drained.
#[derive(Debug, Default)]
pub(super) struct Channel {
    input: VecDeque<i64>,
    output: Vec<i64>,
}

impl Channel {
    /// Appends `values` behind any unconsumed input.
    pub(super) fn feed<I: IntoIterator<Item = i64>>(&mut self, values: I) {
        self.input.extend(values);
    }

    /// Takes the oldest pending input value.
    pub(super) fn pop_input(&mut self) -> Option<i64> {
        self.input.pop_front()
    }

    /// Number of input values not yet consumed.
    pub(super) fn pending_input(&self) -> usize {
        self.input.len()
    }

    pub(super) fn push_output(&mut self, value: i64) {
        self.output.push(value);
    }

    /// Output produced since the last drain, in production order.
    pub(super) fn output(&self) -> &[i64] {
        &self.output
    }

    /// Removes and returns all output, preserving order.
    pub(super) fn drain_output(&mut self) -> Vec<i64> {
        std::mem::take(&mut self.output)
    }
}
