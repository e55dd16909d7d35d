use std::collections::VecDeque;

/// FIFO of work deferred until the current synchronous turn has finished.
#[derive(Debug)]
pub struct TaskQueue<T> {
  tasks: VecDeque<T>,
}

impl<T> Default for TaskQueue<T> {
  fn default() -> Self {
    Self {
      tasks: VecDeque::new(),
    }
  }
}

impl<T> TaskQueue<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn defer(&mut self, task: T) {
    self.tasks.push_back(task);
  }

  pub fn pop(&mut self) -> Option<T> {
    self.tasks.pop_front()
  }

  /// Take everything queued so far. Tasks deferred while the returned batch
  /// runs land in the (now empty) queue for the next turn.
  pub fn take(&mut self) -> VecDeque<T> {
    std::mem::take(&mut self.tasks)
  }

  pub fn clear(&mut self) {
    self.tasks.clear();
  }

  pub fn len(&self) -> usize {
    self.tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tasks.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn runs_in_order() {
    let mut queue = TaskQueue::new();
    queue.defer(1);
    queue.defer(2);
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.pop(), Some(1));

    let batch = queue.take();
    queue.defer(3);
    assert_eq!(batch.into_iter().collect::<Vec<_>>(), vec![2]);
    assert_eq!(queue.pop(), Some(3));
    assert!(queue.is_empty());
  }
}
