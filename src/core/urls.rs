#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    pub const HEALTH: &'static str = "/api/health";

    // Users
    pub const USERS: &'static str = "/api/users";
    pub const USER_BY_ID: &'static str = "/api/users/{id}";
    pub const USER_REGISTER: &'static str = "/api/users/register";
    pub const USER_LOGIN: &'static str = "/api/users/login";

    // Equipment
    pub const EQUIPMENT: &'static str = "/api/equipment";
    pub const EQUIPMENT_BY_ID: &'static str = "/api/equipment/{id}";

    // Maintenance requests
    pub const TASKS: &'static str = "/api/tasks";
    pub const TASK_BY_ID: &'static str = "/api/tasks/{id}";
    pub const TASK_STATUS: &'static str = "/api/tasks/{id}/status";

    // Preventive schedule
    pub const EVENTS: &'static str = "/api/events";
    pub const EVENTS_CALENDAR: &'static str = "/api/events/calendar";
    pub const EVENT_BY_ID: &'static str = "/api/events/{id}";

    // Dashboard
    pub const DASHBOARD_STATS: &'static str = "/api/dashboard/stats";
    pub const DASHBOARD_TEAMS: &'static str = "/api/dashboard/teams";
}

impl ApiUrls {
    /// Fills the `{id}` placeholder of a route constant.
    pub fn with_id(route: &str, id: i32) -> String {
        route.replace("{id}", &id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_id() {
        assert_eq!(ApiUrls::with_id(ApiUrls::TASK_STATUS, 7), "/api/tasks/7/status");
        assert_eq!(ApiUrls::with_id(ApiUrls::USERS, 7), "/api/users");
    }
}
