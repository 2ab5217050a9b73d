use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::error::{OdexError, Result};
use crate::output::{self, Format};
use crate::plan::{FilterSpec, OrderSpec, QueryPlan};
use crate::query::QueryBuilder;

/// Query options gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct UrlArgs {
    pub entity: Option<String>,
    pub plan: Option<PathBuf>,
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub filters: Vec<FilterSpec>,
    pub order_by: Vec<OrderSpec>,
    pub select: Vec<String>,
    pub expand: Vec<String>,
    pub page: Option<u64>,
}

impl UrlArgs {
    fn has_entity_options(&self) -> bool {
        !self.filters.is_empty()
            || !self.order_by.is_empty()
            || !self.select.is_empty()
            || !self.expand.is_empty()
    }

    /// The plan file, if any, with the command-line options layered on top.
    fn into_plan(self) -> Result<Option<QueryPlan>> {
        let mut plan = match &self.plan {
            Some(path) => QueryPlan::load(path)?,
            None => QueryPlan::default(),
        };
        if let Some(entity) = &self.entity {
            plan.entity = entity.clone();
        }
        if plan.entity.trim().is_empty() {
            if self.has_entity_options() || !plan.filters.is_empty() {
                return Err(OdexError::NoEntitySelected);
            }
            return Ok(None);
        }
        plan.top = self.top.or(plan.top);
        plan.skip = self.skip.or(plan.skip);
        plan.filters.extend(self.filters);
        plan.order_by.extend(self.order_by);
        plan.select.extend(self.select);
        plan.expand.extend(self.expand);
        Ok(Some(plan))
    }
}

#[derive(Serialize)]
struct UrlOutput {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip: Option<u64>,
}

pub fn build(builder: &mut QueryBuilder, args: UrlArgs) -> Result<()> {
    let page = args.page;
    let (top, skip) = (args.top, args.skip);
    match args.into_plan()? {
        Some(plan) => plan.apply(builder)?,
        None => {
            if top.is_some() {
                builder.set_top(top);
            }
            if skip.is_some() {
                builder.set_skip(skip);
            }
        }
    }
    if let Some(page) = page {
        builder.set_page(page)?;
    }
    debug!(page = ?page, "built query");
    Ok(())
}

pub fn run(mut builder: QueryBuilder, args: UrlArgs, format: Format) -> Result<()> {
    build(&mut builder, args)?;
    let now = chrono::Utc::now();
    let url = builder.url_at(now)?;
    match format {
        Format::Json => {
            let entity = match builder.selected_entity() {
                Some(id) => Some(builder.catalog().entity_query_name(id)?),
                None => None,
            };
            output::print_json(&UrlOutput {
                filter: builder.filter_expression_at(now)?,
                entity,
                top: builder.top(),
                skip: builder.skip(),
                url,
            })?;
        }
        _ => output::print_url(&url, format)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::test_support::demo;
    use crate::query::QueryOptions;

    fn builder() -> QueryBuilder {
        QueryBuilder::new("http://host/svc", Arc::new(demo()), QueryOptions::default()).unwrap()
    }

    #[test]
    fn command_line_options_extend_the_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        std::fs::write(&path, "entity: Products\ntop: 5\nfilters: ['Name|equals|Bread']\n").unwrap();

        let mut b = builder();
        build(
            &mut b,
            UrlArgs {
                plan: Some(path),
                top: Some(10),
                order_by: vec!["Price desc".parse().unwrap()],
                page: Some(2),
                ..UrlArgs::default()
            },
        )
        .unwrap();
        assert_eq!(
            b.url().unwrap(),
            "http://host/svc/Products?$skip=20&$top=10&$filter=Name eq 'Bread'&$orderby=Price desc"
        );
    }

    #[test]
    fn entity_argument_overrides_plan_entity() {
        let mut b = builder();
        build(
            &mut b,
            UrlArgs {
                entity: Some("Categories".into()),
                ..UrlArgs::default()
            },
        )
        .unwrap();
        assert_eq!(b.url().unwrap(), "http://host/svc/Categories");
    }

    #[test]
    fn options_without_entity_are_rejected() {
        let mut b = builder();
        let err = build(
            &mut b,
            UrlArgs {
                select: vec!["Name".into()],
                ..UrlArgs::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, OdexError::NoEntitySelected));
    }

    #[test]
    fn page_needs_top() {
        let mut b = builder();
        let err = build(
            &mut b,
            UrlArgs {
                entity: Some("Products".into()),
                page: Some(1),
                ..UrlArgs::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, OdexError::PageSizeRequired));
    }
}
