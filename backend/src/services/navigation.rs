use serde::Serialize;

/// Screens of the console and their paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    Dashboard,
    Routines,
    Courses,
    Notices,
    AcademicBills,
}

impl Screen {
    pub fn path(self) -> &'static str {
        match self {
            Screen::Login => "/",
            Screen::Dashboard => "/dashboard",
            Screen::Routines => "/routines",
            Screen::Courses => "/courses",
            Screen::Notices => "/notices",
            Screen::AcademicBills => "/academic-bills",
        }
    }
}

impl Serialize for Screen {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub title: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    /// `None` for tiles that do not lead anywhere yet.
    pub route: Option<Screen>,
}

const fn item(title: &'static str, icon: &'static str, description: &'static str, route: Option<Screen>) -> MenuItem {
    MenuItem {
        title,
        icon,
        description,
        route,
    }
}

pub fn dashboard_menu() -> Vec<MenuItem> {
    vec![
        item("Routines", "📅", "Manage class schedules and timetables", Some(Screen::Routines)),
        item("Courses", "📚", "Course management and curriculum", Some(Screen::Courses)),
        item("Results", "📊", "Student results and grading", None),
        item("Notices", "📢", "Announcements and notifications", Some(Screen::Notices)),
        item("Academic Bills", "💰", "Manage academic fees and billing", Some(Screen::AcademicBills)),
        item("All Students", "👥", "Student database and profiles", None),
        item("Faculty", "👨‍🏫", "Faculty management and records", None),
        item("Departments", "🏢", "Department administration", None),
        item("Reports", "📈", "Analytics and reports", None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screens_serialize_as_paths() {
        let json = serde_json::to_value([Screen::Login, Screen::AcademicBills]).unwrap();
        assert_eq!(json, serde_json::json!(["/", "/academic-bills"]));
    }

    #[test]
    fn menu_routes_only_to_built_screens() {
        let routed: Vec<&str> = dashboard_menu()
            .iter()
            .filter_map(|item| item.route.map(|_| item.title))
            .collect();
        assert_eq!(routed, vec!["Routines", "Courses", "Notices", "Academic Bills"]);
    }
}
