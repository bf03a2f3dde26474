use parking_lot::Mutex;

use crate::request::Request;
use crate::status::RobotStatus;

struct WorkerState {
    status: RobotStatus,
    battery: u32,
    task: Option<Request>,
}

/// Shared, per-robot state cell.
///
/// `status` and `battery` are safe for external readers (the dashboard,
/// the charging station) and never tear: every read/write goes through
/// the same `parking_lot::Mutex`, kept uncontended by making every
/// critical section a handful of field assignments with no I/O inside.
///
/// Ownership discipline (enforced by callers, not the type itself):
/// while a worker is CHARGING, the station that dequeued it owns
/// `battery` and `status`; at all other times the worker's own task loop
/// owns them. Hand-off happens at pool dequeue and at release.
pub struct WorkerHandle {
    pub id: String,
    max_battery: u32,
    state: Mutex<WorkerState>,
}

/// Point-in-time, self-consistent view of a worker, safe to hand to a
/// dashboard poller without holding any lock.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorkerSnapshot {
    pub id: String,
    pub status: RobotStatus,
    pub battery: u32,
    pub task_id: Option<String>,
}

impl WorkerHandle {
    pub fn new(id: impl Into<String>, max_battery: u32) -> Self {
        Self {
            id: id.into(),
            max_battery,
            state: Mutex::new(WorkerState {
                status: RobotStatus::Idle,
                battery: max_battery,
                task: None,
            }),
        }
    }

    pub fn status(&self) -> RobotStatus {
        self.state.lock().status
    }

    pub fn battery(&self) -> u32 {
        self.state.lock().battery
    }

    pub fn task(&self) -> Option<Request> {
        self.state.lock().task.clone()
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        let s = self.state.lock();
        WorkerSnapshot {
            id: self.id.clone(),
            status: s.status,
            battery: s.battery,
            task_id: s.task.as_ref().map(|r| r.id.clone()),
        }
    }

    pub fn set_status(&self, status: RobotStatus) {
        self.state.lock().status = status;
    }

    /// Accepts `task`, marking the worker WORKING. The invariant
    /// `task != None <=> status == WORKING` is established here.
    pub fn begin_task(&self, task: Request) {
        let mut s = self.state.lock();
        s.task = Some(task);
        s.status = RobotStatus::Working;
    }

    /// Clears the current task without changing `status`; callers set
    /// the next status (IDLE or LOW_BATTERY) themselves right after.
    pub fn clear_task(&self) {
        self.state.lock().task = None;
    }

    /// Drains `amount` from battery, clamped at zero. Returns the new level.
    pub fn drain_battery(&self, amount: u32) -> u32 {
        let mut s = self.state.lock();
        s.battery = s.battery.saturating_sub(amount);
        s.battery
    }

    /// Adds `amount` to battery, clamped at `MAX_BATTERY`. Returns the new level.
    pub fn charge_tick(&self, amount: u32) -> u32 {
        let mut s = self.state.lock();
        s.battery = (s.battery + amount).min(self.max_battery);
        s.battery
    }

    pub fn is_full(&self) -> bool {
        self.battery() >= self.max_battery
    }

    pub fn max_battery(&self) -> u32 {
        self.max_battery
    }
}
