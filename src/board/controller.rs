use log::{info, warn};

use super::client::{ClientError, TaskApi};
use super::view_model::BoardViewModel;
use crate::tasks::types::{CreateTaskRequest, Task, TaskQuery, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging { task_id: i32 },
    Pending { task_id: i32, target: TaskStatus },
}

/// Where a card was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Column(TaskStatus),
    /// Another card; its current column is the target.
    Card(i32),
}

#[derive(Debug)]
pub enum DropOutcome {
    /// Released outside any target.
    Cancelled,
    /// Target column equals the task's current status.
    Unchanged,
    Committed(Task),
    /// The server refused; the board was refetched.
    RolledBack(ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    #[error("another drag gesture is still in progress")]
    GestureInProgress,
    #[error("no drag gesture is active")]
    NotDragging,
    #[error("task {0} is not on the board")]
    UnknownTask(i32),
}

/// Turns drag gestures into status transitions against the task service.
#[derive(Debug)]
pub struct KanbanController<A> {
    api: A,
    board: BoardViewModel,
    filter: TaskQuery,
    state: DragState,
}

impl<A: TaskApi> KanbanController<A> {
    pub fn new(api: A) -> Self {
        Self::with_filter(api, TaskQuery::default())
    }

    pub fn with_filter(api: A, filter: TaskQuery) -> Self {
        Self {
            api,
            board: BoardViewModel::default(),
            filter,
            state: DragState::Idle,
        }
    }

    pub fn board(&self) -> &BoardViewModel {
        &self.board
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn load(&mut self) -> Result<(), ClientError> {
        let tasks = self.api.list_tasks(&self.filter).await?;
        info!("Loaded {} tasks onto the board", tasks.len());
        self.board.replace_all(tasks);
        Ok(())
    }

    pub async fn set_filter(&mut self, filter: TaskQuery) -> Result<(), ClientError> {
        self.filter = filter;
        self.load().await
    }

    pub async fn create_task(&mut self, req: CreateTaskRequest) -> Result<Task, ClientError> {
        let task = self.api.create_task(&req).await?;
        self.board.prepend(task.clone());
        Ok(task)
    }

    pub fn begin_drag(&mut self, task_id: i32) -> Result<(), DragError> {
        if self.state != DragState::Idle {
            return Err(DragError::GestureInProgress);
        }
        if self.board.find(task_id).is_none() {
            return Err(DragError::UnknownTask(task_id));
        }
        self.state = DragState::Dragging { task_id };
        Ok(())
    }

    fn resolve_target(&self, target: DropTarget) -> Option<TaskStatus> {
        match target {
            DropTarget::Column(status) => Some(status),
            DropTarget::Card(id) => self.board.find(id).map(Task::status),
        }
    }

    /// Ends the active gesture. `None` means the card was released outside
    /// every column.
    pub async fn drop_on(&mut self, target: Option<DropTarget>) -> Result<DropOutcome, DragError> {
        let DragState::Dragging { task_id } = self.state else {
            return Err(DragError::NotDragging);
        };

        let Some(target) = target.and_then(|t| self.resolve_target(t)) else {
            self.state = DragState::Idle;
            return Ok(DropOutcome::Cancelled);
        };

        let current = self.board.find(task_id).map(Task::status);
        if current == Some(target) || current.is_none() {
            self.state = DragState::Idle;
            return Ok(DropOutcome::Unchanged);
        }

        self.state = DragState::Pending { task_id, target };
        let outcome = match self.api.update_status(task_id, target).await {
            Ok(task) => {
                info!("Task {task_id} moved to {target}");
                self.board.apply(task.clone());
                DropOutcome::Committed(task)
            }
            Err(e) => {
                warn!("Moving task {task_id} to {target} failed: {e}");
                if let Err(refetch) = self.load().await {
                    warn!("Board refetch after failed move also failed: {refetch}");
                }
                DropOutcome::RolledBack(e)
            }
        };
        self.state = DragState::Idle;
        Ok(outcome)
    }
}
