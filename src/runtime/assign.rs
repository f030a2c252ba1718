//! Random task assignment for simulated customers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::{Customer, Task};

/// Draw `count` tasks uniformly at random. A fixed `seed` makes the draw
/// reproducible.
pub fn random_tasks(count: usize, seed: Option<u64>) -> Vec<Task> {
    match seed {
        Some(seed) => draw(&mut StdRng::seed_from_u64(seed), count),
        None => draw(&mut rand::rng(), count),
    }
}

fn draw<R: Rng>(rng: &mut R, count: usize) -> Vec<Task> {
    (0..count)
        .map(|_| Task::ALL[rng.random_range(0..Task::ALL.len())])
        .collect()
}

/// Number customers `0..` in task order.
pub fn customers_from_tasks(tasks: &[Task]) -> Vec<Customer> {
    tasks
        .iter()
        .enumerate()
        .map(|(id, &task)| Customer::new(id, task))
        .collect()
}
