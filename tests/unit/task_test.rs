//! Tests for tasks and random task assignment

use post_office::core::Task;
use post_office::runtime::{customers_from_tasks, random_tasks};

#[test]
fn test_task_phrases() {
    assert_eq!(Task::BuyStamps.to_string(), "buy stamps");
    assert_eq!(Task::MailLetter.progressive_phrase(), "mailing a letter");
}

#[test]
fn test_task_serializes_snake_case() {
    assert_eq!(serde_json::to_string(&Task::MailPackage).unwrap(), "\"mail_package\"");
}

#[test]
fn test_random_assignment_covers_every_task() {
    let tasks = random_tasks(300, Some(1234));
    assert_eq!(tasks.len(), 300);
    for task in Task::ALL {
        assert!(tasks.contains(&task), "{task:?} never drawn");
    }
    assert!(random_tasks(0, None).is_empty());
}

#[test]
fn test_customers_numbered_in_order() {
    let customers = customers_from_tasks(&[Task::MailPackage, Task::BuyStamps, Task::BuyStamps]);
    let ids: Vec<usize> = customers.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(customers[0].task, Task::MailPackage);
}
