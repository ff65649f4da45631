//! Screen type registry: maps the business screen name a page carries to
//! the rendering strategy that handles it. Unmapped names fall back to
//! [`ScreenType::Placeholder`], which is an expected steady state.

/// Closed set of screen categories. Dispatch on this enum is exhaustive,
/// so a new category cannot be added without handling it everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenType {
    Dashboard,
    Recalculation,
    ViewData,
    Uploads,
    AuditTable,
    Templates,
    Placeholder,
}

/// Static descriptive metadata for a screen type. The placeholder screen
/// renders exclusively from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenTypeInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// Resolve a page's screen type by exact `page_name` match. This is the
/// single source of truth for the page-to-screen mapping.
pub fn screen_type_for(page_name: &str) -> ScreenType {
    match page_name {
        "Rates Dashboard" | "Term Sofr" | "Active Transaction" | "Failed Transaction"
        | "Logs" => ScreenType::Dashboard,
        "Templates" => ScreenType::Templates,
        "Recalculate" => ScreenType::Recalculation,
        "View Data" => ScreenType::ViewData,
        "Uploads" => ScreenType::Uploads,
        "Audit Table" => ScreenType::AuditTable,
        _ => ScreenType::Placeholder,
    }
}

pub fn screen_type_info(screen_type: ScreenType) -> ScreenTypeInfo {
    match screen_type {
        ScreenType::Dashboard => ScreenTypeInfo {
            name: "Dashboard",
            description: "Interactive dashboard with data visualization and controls",
            icon: "📊",
        },
        ScreenType::Recalculation => ScreenTypeInfo {
            name: "Recalculation",
            description: "Recalculation and processing functionality",
            icon: "🧮",
        },
        ScreenType::ViewData => ScreenTypeInfo {
            name: "View Data",
            description: "Data viewing and browsing interface",
            icon: "📄",
        },
        ScreenType::Uploads => ScreenTypeInfo {
            name: "Uploads",
            description: "File upload and management interface",
            icon: "⬆",
        },
        ScreenType::AuditTable => ScreenTypeInfo {
            name: "Audit Table",
            description: "Audit log and history tracking",
            icon: "🕘",
        },
        ScreenType::Templates => ScreenTypeInfo {
            name: "Templates",
            description: "Template management and configuration",
            icon: "📋",
        },
        ScreenType::Placeholder => ScreenTypeInfo {
            name: "Coming Soon",
            description: "This feature is under development",
            icon: "🚧",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pages_resolve() {
        assert_eq!(screen_type_for("Rates Dashboard"), ScreenType::Dashboard);
        assert_eq!(screen_type_for("Templates"), ScreenType::Templates);
        assert_eq!(screen_type_for("Recalculate"), ScreenType::Recalculation);
        assert_eq!(screen_type_for("Audit Table"), ScreenType::AuditTable);
    }

    #[test]
    fn unknown_pages_fall_back_to_placeholder() {
        assert_eq!(screen_type_for("No Such Page"), ScreenType::Placeholder);
        assert_eq!(screen_type_for(""), ScreenType::Placeholder);
    }

    #[test]
    fn placeholder_metadata_is_static() {
        let info = screen_type_info(ScreenType::Placeholder);
        assert_eq!(info.name, "Coming Soon");
        assert!(!info.description.is_empty());
    }
}
