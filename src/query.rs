use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::catalog::{Catalog, EntityId, ItemId, ItemKind, PathStep};
use crate::error::{OdexError, Result};
use crate::filters::{FilterFamily, RenderOptions, render_where};

/// Strip a trailing `$metadata` and make sure the URL ends with `/`.
pub fn clean_endpoint_url(url: &str) -> String {
    let trimmed = url.trim();
    let base = trimmed.strip_suffix("$metadata").unwrap_or(trimmed);
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryOptions {
    pub encode_url_components: bool,
    pub max_navigation_depth: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            encode_url_components: false,
            max_navigation_depth: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[value(name = "asc")]
    Ascending,
    #[value(name = "desc")]
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhereFilter {
    pub id: String,
    pub path: Vec<PathStep>,
    pub operator: usize,
    pub value: Option<String>,
}

/// Query state for one endpoint: the selected entity plus its paging, where,
/// order-by, select and expand options.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    endpoint: String,
    catalog: Arc<Catalog>,
    options: QueryOptions,
    top: Option<u64>,
    skip: Option<u64>,
    selected: Option<EntityId>,
    filter_seq: usize,
    filters: Vec<WhereFilter>,
    order_by: Vec<(ItemId, SortDirection)>,
    select: Vec<ItemId>,
    expand: Vec<ItemId>,
}

impl QueryBuilder {
    pub fn new(endpoint: &str, catalog: Arc<Catalog>, options: QueryOptions) -> Result<Self> {
        if endpoint.trim().is_empty() {
            return Err(OdexError::MissingEndpoint);
        }
        Ok(Self {
            endpoint: clean_endpoint_url(endpoint),
            catalog,
            options,
            top: None,
            skip: None,
            selected: None,
            filter_seq: 0,
            filters: Vec::new(),
            order_by: Vec::new(),
            select: Vec::new(),
            expand: Vec::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn top(&self) -> Option<u64> {
        self.top
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn set_top(&mut self, top: Option<u64>) {
        self.top = top;
    }

    pub fn set_skip(&mut self, skip: Option<u64>) {
        self.skip = skip;
    }

    /// Lenient count parsing for user input: anything non-numeric clears it.
    pub fn parse_count(raw: &str) -> Option<u64> {
        raw.trim().parse().ok()
    }

    pub fn selected_entity(&self) -> Option<EntityId> {
        self.selected
    }

    /// Switching to another entity drops every option tied to the old one.
    pub fn select_entity(&mut self, id: EntityId) -> Result<()> {
        self.catalog.entity(id)?;
        if self.selected != Some(id) {
            self.reset();
            self.selected = Some(id);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.filters.clear();
        self.order_by.clear();
        self.select.clear();
        self.expand.clear();
    }

    fn require_entity(&self) -> Result<EntityId> {
        self.selected.ok_or(OdexError::NoEntitySelected)
    }

    pub fn filters(&self) -> &[WhereFilter] {
        &self.filters
    }

    pub fn next_filter_id(&mut self) -> String {
        let id = format!("filter{}", self.filter_seq);
        self.filter_seq += 1;
        id
    }

    fn render_options(&self, now: DateTime<Utc>) -> RenderOptions {
        RenderOptions {
            encode_url_components: self.options.encode_url_components,
            now,
        }
    }

    fn render_filter(&self, filter: &WhereFilter, now: DateTime<Utc>) -> Result<String> {
        let leaf = filter.path.last().ok_or(OdexError::EmptyPath)?;
        let family = self.catalog.filter_family(leaf.entity, leaf.item)?;
        let segments = self.catalog.describe_path(&filter.path)?;
        render_where(
            family,
            filter.operator,
            &segments,
            filter.value.as_deref(),
            &self.render_options(now),
        )
    }

    fn validate_filter(&self, filter: &WhereFilter) -> Result<()> {
        let entity = self.require_entity()?;
        let first = filter.path.first().ok_or(OdexError::EmptyPath)?;
        if first.entity != entity {
            return Err(OdexError::UnresolvedNavigation(
                self.catalog.entity(first.entity)?.name.clone(),
            ));
        }
        let depth = filter.path.len() - 1;
        if depth > self.options.max_navigation_depth {
            return Err(OdexError::NavigationDepthExceeded {
                depth,
                max: self.options.max_navigation_depth,
            });
        }
        self.render_filter(filter, Utc::now()).map(|_| ())
    }

    /// Replace the filter with the same id, or append it.
    pub fn add_or_update_filter(&mut self, filter: WhereFilter) -> Result<()> {
        self.validate_filter(&filter)?;
        debug!(id = %filter.id, steps = filter.path.len(), operator = filter.operator, "where filter");
        match self.filters.iter_mut().find(|f| f.id == filter.id) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
        Ok(())
    }

    pub fn remove_filter(&mut self, id: &str) -> Result<WhereFilter> {
        let index = self
            .filters
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| OdexError::FilterNotFound(id.to_string()))?;
        Ok(self.filters.remove(index))
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    fn require_item(&self, item: ItemId, kind: ItemKind) -> Result<()> {
        let entity = self.require_entity()?;
        let found = self.catalog.query_item(entity, item)?;
        match (found.kind, kind) {
            (ItemKind::Property, ItemKind::NavigationProperty) => {
                Err(OdexError::NotANavigationProperty(found.name))
            }
            (ItemKind::NavigationProperty, ItemKind::Property) => {
                Err(OdexError::NotAProperty(found.name))
            }
            _ => Ok(()),
        }
    }

    /// `None` removes the entry; updating keeps its original position.
    pub fn set_order_by(&mut self, item: ItemId, direction: Option<SortDirection>) -> Result<()> {
        self.require_item(item, ItemKind::Property)?;
        let existing = self.order_by.iter().position(|(id, _)| *id == item);
        match (existing, direction) {
            (Some(index), Some(direction)) => self.order_by[index].1 = direction,
            (Some(index), None) => {
                self.order_by.remove(index);
            }
            (None, Some(direction)) => self.order_by.push((item, direction)),
            (None, None) => {}
        }
        Ok(())
    }

    pub fn set_select(&mut self, item: ItemId, selected: bool) -> Result<()> {
        self.require_item(item, ItemKind::Property)?;
        toggle(&mut self.select, item, selected);
        Ok(())
    }

    pub fn set_expand(&mut self, item: ItemId, expanded: bool) -> Result<()> {
        self.require_item(item, ItemKind::NavigationProperty)?;
        toggle(&mut self.expand, item, expanded);
        Ok(())
    }

    pub fn clear_order_by(&mut self) {
        self.order_by.clear();
    }

    pub fn clear_select(&mut self) {
        self.select.clear();
    }

    pub fn clear_expand(&mut self) {
        self.expand.clear();
    }

    pub fn filter_expression_at(&self, now: DateTime<Utc>) -> Result<Option<String>> {
        if self.filters.is_empty() {
            return Ok(None);
        }
        let clauses = self
            .filters
            .iter()
            .map(|f| self.render_filter(f, now))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(clauses.join(" and ")))
    }

    pub fn url(&self) -> Result<String> {
        self.url_at(Utc::now())
    }

    pub fn url_at(&self, now: DateTime<Utc>) -> Result<String> {
        let mut url = self.endpoint.clone();
        let mut params = Vec::new();

        if let Some(entity) = self.selected {
            url.push_str(&self.catalog.entity_query_name(entity)?);
        }
        if let Some(skip) = self.skip {
            params.push(format!("$skip={skip}"));
        }
        if let Some(top) = self.top {
            params.push(format!("$top={top}"));
        }
        if let Some(filter) = self.filter_expression_at(now)? {
            params.push(format!("$filter={filter}"));
        }

        if let Some(entity) = self.selected {
            if !self.order_by.is_empty() {
                let terms = self
                    .order_by
                    .iter()
                    .map(|(item, direction)| -> Result<String> {
                        let name = self.catalog.query_item(entity, *item)?.name;
                        Ok(match direction {
                            SortDirection::Ascending => name,
                            SortDirection::Descending => format!("{name} desc"),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                params.push(format!("$orderby={}", terms.join(",")));
            }
            if !self.select.is_empty() {
                params.push(format!("$select={}", self.item_names(entity, &self.select)?));
            }
            if !self.expand.is_empty() {
                params.push(format!("$expand={}", self.item_names(entity, &self.expand)?));
            }
        }

        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        debug!(url = %url, "generated query url");
        Ok(url)
    }

    fn item_names(&self, entity: EntityId, items: &[ItemId]) -> Result<String> {
        let names = items
            .iter()
            .map(|item| self.catalog.query_item(entity, *item).map(|i| i.name))
            .collect::<Result<Vec<_>>>()?;
        Ok(names.join(","))
    }

    pub fn next_page(&mut self) -> Result<()> {
        let top = self.top.ok_or(OdexError::PageSizeRequired)?;
        self.skip = Some(self.skip.unwrap_or(0).saturating_add(top));
        Ok(())
    }

    pub fn previous_page(&mut self) -> Result<()> {
        let top = self.top.ok_or(OdexError::PageSizeRequired)?;
        let skip = self.skip.unwrap_or(0).saturating_sub(top);
        self.skip = (skip > 0).then_some(skip);
        Ok(())
    }

    /// Zero-based page: `$skip = page * $top`.
    pub fn set_page(&mut self, page: u64) -> Result<()> {
        let top = self.top.ok_or(OdexError::PageSizeRequired)?;
        let skip = page.saturating_mul(top);
        self.skip = (skip > 0).then_some(skip);
        Ok(())
    }

    /// Family of the property a path ends in.
    pub fn family_for(&self, path: &[PathStep]) -> Result<FilterFamily> {
        let leaf = path.last().ok_or(OdexError::EmptyPath)?;
        self.catalog.filter_family(leaf.entity, leaf.item)
    }
}

fn toggle(items: &mut Vec<ItemId>, item: ItemId, on: bool) {
    let position = items.iter().position(|i| *i == item);
    match (position, on) {
        (None, true) => items.push(item),
        (Some(index), false) => {
            items.remove(index);
        }
        _ => {}
    }
}
