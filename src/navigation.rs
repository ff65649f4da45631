//! Navigation generator: turns a [`NavigationConfig`] into the side-nav
//! item tree, the route table and the default landing path.

use crate::types::{NavigationConfig, NavigationModule, NavigationPage};

/// Module codes excluded from navigation and routing. Configuration
/// constant, not user input.
pub const REMOVED_MODULES: &[&str] = &["CARTS", "USERS", "REPORTS", "INTEGRATIONS"];

/// Separator between the module and page part of a child item id. Must
/// never appear inside a slug so the id stays re-parseable.
pub const ID_SEPARATOR: &str = "::";

/// Display-ready navigation item. Rebuilt from scratch whenever the
/// navigation config changes; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationItem {
    pub id: String,
    pub label: String,
    pub path: String,
    /// True when clicking the item navigates directly. A parent with
    /// children only expands.
    pub navigable: bool,
    pub children: Vec<NavigationItem>,
}

/// One mountable route derived from the navigation config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: String,
    pub page_name: String,
    pub module_code: String,
}

/// Slug for a module code: lowercase, `_` replaced with `-`.
pub fn module_slug(module_code: &str) -> String {
    module_code.to_lowercase().replace('_', "-")
}

/// Slug for a page code: lowercase only.
pub fn page_slug(page_code: &str) -> String {
    page_code.to_lowercase()
}

/// Split a child item id back into its module and page slugs.
pub fn parse_item_id(id: &str) -> Option<(&str, &str)> {
    id.split_once(ID_SEPARATOR)
}

fn filtered_sorted_modules(config: &NavigationConfig) -> Vec<&NavigationModule> {
    let mut modules: Vec<&NavigationModule> = config
        .modules
        .iter()
        .filter(|m| !REMOVED_MODULES.contains(&m.module_code.as_str()))
        .collect();
    // sort_by is stable, ties keep their input order
    modules.sort_by(|a, b| a.display_order.cmp(&b.display_order));
    modules
}

fn sorted_pages(module: &NavigationModule) -> Vec<&NavigationPage> {
    let mut pages: Vec<&NavigationPage> = module.pages.iter().collect();
    pages.sort_by(|a, b| a.display_order.cmp(&b.display_order));
    pages
}

/// Build the hierarchical navigation item tree.
///
/// Modules without pages become single navigable items; modules with
/// pages become a non-navigable parent whose children carry compound
/// `"<module>::<page>"` ids.
pub fn generate_navigation_items(config: &NavigationConfig) -> Vec<NavigationItem> {
    filtered_sorted_modules(config)
        .into_iter()
        .map(|module| {
            let module_key = module_slug(&module.module_code);
            let module_path = format!("/{module_key}");
            let children: Vec<NavigationItem> = sorted_pages(module)
                .into_iter()
                .map(|page| {
                    let page_key = page_slug(&page.page_code);
                    NavigationItem {
                        id: format!("{module_key}{ID_SEPARATOR}{page_key}"),
                        label: page.page_name.clone(),
                        path: format!("{module_path}/{page_key}"),
                        navigable: true,
                        children: Vec::new(),
                    }
                })
                .collect();
            NavigationItem {
                id: module_key,
                label: module.module_name.clone(),
                path: module_path,
                navigable: children.is_empty(),
                children,
            }
        })
        .collect()
}

/// Landing route for `/`: the first page of the first module that has
/// pages, after the same filter and sort, or `/` when none does.
pub fn default_navigation_path(config: &NavigationConfig) -> String {
    for module in filtered_sorted_modules(config) {
        if let Some(first_page) = sorted_pages(module).first() {
            return format!(
                "/{}/{}",
                module_slug(&module.module_code),
                page_slug(&first_page.page_code)
            );
        }
    }
    "/".to_string()
}

/// Flat route table: one entry per page, plus one per page-less module.
pub fn generate_routes(config: &NavigationConfig) -> Vec<RouteEntry> {
    let mut routes = Vec::new();
    for module in filtered_sorted_modules(config) {
        let module_path = format!("/{}", module_slug(&module.module_code));
        if module.pages.is_empty() {
            routes.push(RouteEntry {
                path: module_path,
                page_name: module.module_name.clone(),
                module_code: module.module_code.clone(),
            });
        } else {
            for page in sorted_pages(module) {
                routes.push(RouteEntry {
                    path: format!("{module_path}/{}", page_slug(&page.page_code)),
                    page_name: page.page_name.clone(),
                    module_code: module.module_code.clone(),
                });
            }
        }
    }
    routes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(code: &str, order: i64, pages: Vec<NavigationPage>) -> NavigationModule {
        NavigationModule {
            module_code: code.to_string(),
            module_name: code.to_string(),
            display_order: order,
            pages,
        }
    }

    fn page(code: &str, order: i64) -> NavigationPage {
        NavigationPage {
            page_code: code.to_string(),
            page_name: code.to_string(),
            display_order: order,
        }
    }

    #[test]
    fn module_slug_lowercases_and_replaces_underscores() {
        assert_eq!(module_slug("TERM_SOFR"), "term-sofr");
        assert_eq!(module_slug("RATES"), "rates");
    }

    #[test]
    fn child_ids_round_trip_to_paths() {
        let config = NavigationConfig {
            modules: vec![module("RATES_PORTAL", 1, vec![page("dash", 1), page("logs", 2)])],
        };
        let items = generate_navigation_items(&config);
        for child in &items[0].children {
            let (module_key, page_key) = parse_item_id(&child.id).unwrap();
            assert_eq!(format!("/{module_key}/{page_key}"), child.path);
        }
    }

    #[test]
    fn pageless_module_is_directly_navigable() {
        let config = NavigationConfig {
            modules: vec![module("QRM", 1, vec![])],
        };
        let items = generate_navigation_items(&config);
        assert!(items[0].navigable);
        assert_eq!(items[0].path, "/qrm");
        assert!(items[0].children.is_empty());
    }

    #[test]
    fn routes_cover_pageless_modules_and_pages() {
        let config = NavigationConfig {
            modules: vec![
                module("QRM", 2, vec![]),
                module("RATES", 1, vec![page("dashboard", 1)]),
            ],
        };
        let routes = generate_routes(&config);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].path, "/rates/dashboard");
        assert_eq!(routes[1].path, "/qrm");
    }
}
