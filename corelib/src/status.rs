/// Lifecycle tag for a `Request`. PENDING on create; IN_PROGRESS on worker
/// acceptance; terminal in {COMPLETED, FAILED}. Terminal states never
/// transition further.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Failed)
    }

    /// The enum name as written into the binary report and log lines
    /// (`"PENDING"`, `"IN_PROGRESS"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::InProgress => "IN_PROGRESS",
            RequestStatus::Completed => "COMPLETED",
            RequestStatus::Failed => "FAILED",
        }
    }
}

/// Per-robot lifecycle tag. LOW_BATTERY ("I have decided to charge") and
/// WAITING_FOR_CHARGE ("I am queued for a station") are intentionally
/// distinct states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RobotStatus {
    Idle,
    Working,
    LowBattery,
    WaitingForCharge,
    Charging,
}

impl RobotStatus {
    pub fn name(self) -> &'static str {
        match self {
            RobotStatus::Idle => "IDLE",
            RobotStatus::Working => "WORKING",
            RobotStatus::LowBattery => "LOW_BATTERY",
            RobotStatus::WaitingForCharge => "WAITING_FOR_CHARGE",
            RobotStatus::Charging => "CHARGING",
        }
    }
}
