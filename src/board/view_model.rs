use crate::tasks::types::{Task, TaskStatus};

fn column_index(status: TaskStatus) -> usize {
    match status {
        TaskStatus::New => 0,
        TaskStatus::InProgress => 1,
        TaskStatus::Repaired => 2,
        TaskStatus::Scrap => 3,
    }
}

/// Server-ordered task list partitioned into one column per status.
///
/// The flat list is the source of truth. Every mutation rebuilds the
/// partition so each task sits in exactly the column its status names,
/// in the order the server returned it.
#[derive(Debug, Clone, Default)]
pub struct BoardViewModel {
    tasks: Vec<Task>,
    columns: [Vec<usize>; 4],
}

impl BoardViewModel {
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut board = Self {
            tasks,
            columns: Default::default(),
        };
        board.regroup();
        board
    }

    fn regroup(&mut self) {
        for column in &mut self.columns {
            column.clear();
        }
        for (index, task) in self.tasks.iter().enumerate() {
            self.columns[column_index(task.status())].push(index);
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        self.columns[column_index(status)]
            .iter()
            .map(|&i| &self.tasks[i])
            .collect()
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.columns[column_index(status)].len()
    }

    /// All four columns in board order.
    pub fn columns(&self) -> Vec<(TaskStatus, Vec<&Task>)> {
        TaskStatus::ALL
            .iter()
            .map(|&status| (status, self.column(status)))
            .collect()
    }

    pub fn find(&self, id: i32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.regroup();
    }

    /// Inserts a freshly created task at the top, matching newest-first order.
    pub fn prepend(&mut self, task: Task) {
        self.tasks.insert(0, task);
        self.regroup();
    }

    /// Replaces the stored copy of `task` with the server's record.
    /// Returns false when the task is not on the board.
    pub fn apply(&mut self, task: Task) -> bool {
        let Some(slot) = self.tasks.iter_mut().find(|t| t.id() == task.id()) else {
            return false;
        };
        *slot = task;
        self.regroup();
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::equipment::types::EquipmentRef;
    use crate::tasks::types::{TaskPriority, TaskRecord};
    use chrono::{TimeZone, Utc};

    pub(crate) fn card(id: i32, status: TaskStatus) -> Task {
        let at = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
        Task {
            record: TaskRecord {
                id,
                title: format!("Task {id}"),
                description: String::new(),
                status,
                priority: TaskPriority::Medium,
                team: "Maintenance".to_string(),
                assigned_date: at,
                completion_date: None,
                equipment_id: 1,
                user_id: None,
                version: 1,
                created_at: at,
                updated_at: at,
            },
            equipment: EquipmentRef {
                id: 1,
                name: "Lathe".to_string(),
                serial_number: "LT-01".to_string(),
            },
            user: None,
        }
    }

    fn ids(tasks: &[&Task]) -> Vec<i32> {
        tasks.iter().map(|t| t.id()).collect()
    }

    #[test]
    fn test_partition_is_total_and_ordered() {
        let board = BoardViewModel::new(vec![
            card(5, TaskStatus::New),
            card(4, TaskStatus::Repaired),
            card(3, TaskStatus::New),
            card(2, TaskStatus::Scrap),
            card(1, TaskStatus::InProgress),
        ]);

        assert_eq!(ids(&board.column(TaskStatus::New)), vec![5, 3]);
        assert_eq!(board.count(TaskStatus::InProgress), 1);
        let total: usize = TaskStatus::ALL.iter().map(|&s| board.count(s)).sum();
        assert_eq!(total, board.len());
        for (status, tasks) in board.columns() {
            assert!(tasks.iter().all(|t| t.status() == status));
        }
    }

    #[test]
    fn test_apply_moves_card_between_columns() {
        let mut board = BoardViewModel::new(vec![card(7, TaskStatus::New), card(6, TaskStatus::New)]);
        let mut moved = card(7, TaskStatus::Repaired);
        moved.record.completion_date = Some(Utc::now());

        assert!(board.apply(moved));
        assert_eq!(ids(&board.column(TaskStatus::New)), vec![6]);
        assert_eq!(ids(&board.column(TaskStatus::Repaired)), vec![7]);
        assert!(board.find(7).and_then(|t| t.record.completion_date).is_some());

        assert!(!board.apply(card(99, TaskStatus::Scrap)));
    }

    #[test]
    fn test_prepend_keeps_newest_first() {
        let mut board = BoardViewModel::new(vec![card(1, TaskStatus::New)]);
        board.prepend(card(2, TaskStatus::New));
        assert_eq!(ids(&board.column(TaskStatus::New)), vec![2, 1]);
    }
}
