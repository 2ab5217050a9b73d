//! Read-only index over a [`Metadata`] document.
//!
//! Entities are addressed by their position in the schema's entity type list
//! ([`EntityId`]). The queryable members of an entity are numbered as
//! [`ItemId`]s: acceptable properties first (own, then inherited), followed by
//! acceptable navigation properties in the same order.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{OdexError, Result};
use crate::filters::FilterFamily;
use crate::model::{
    Annotations, Association, AssociationSet, ComplexType, EntitySet, EntityType, Metadata,
    Multiplicity, NavigationProperty, Property,
};

pub type EntityId = usize;
pub type ItemId = usize;

const DESCRIPTION_TERM: &str = "Org.OData.Display.V1.Description";
const LISTING_PADDING: &str = ". . ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Property,
    NavigationProperty,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property => write!(f, "property"),
            Self::NavigationProperty => write!(f, "navigation_property"),
        }
    }
}

/// A property or navigation property offered for query building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryItem {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub edm_type: Option<String>,
}

/// One row of the entity picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityEntry {
    pub id: EntityId,
    pub name: String,
    pub display_name: String,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
}

/// One hop of a filter path: `item` is looked up on `entity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PathStep {
    pub entity: EntityId,
    pub item: ItemId,
}

/// A resolved path segment, ready for query-string assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSegment {
    pub name: String,
    pub collection: bool,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    namespace: String,
    entities: Vec<EntityType>,
    complex_types: Vec<ComplexType>,
    associations: Vec<Association>,
    entity_sets: Vec<EntitySet>,
    association_sets: Vec<AssociationSet>,
    annotations: Vec<Annotations>,
}

impl Catalog {
    pub fn new(metadata: Metadata) -> Result<Self> {
        let mut types = None;
        let mut container = None;
        let mut annotations = Vec::new();

        for schema in metadata.data_services.schema {
            annotations.extend(schema.annotations);
            if !schema.entity_container.is_empty() {
                let mut containers = schema.entity_container;
                let index = containers
                    .iter()
                    .position(|c| c.is_default_entity_container)
                    .unwrap_or(0);
                container = Some(containers.swap_remove(index));
            }
            if !schema.entity_type.is_empty() {
                types = Some((
                    schema.namespace,
                    schema.entity_type,
                    schema.complex_type,
                    schema.association,
                ));
            }
        }

        let (namespace, entities, complex_types, associations) =
            types.ok_or(OdexError::NoEntityTypes)?;
        let container = container.ok_or(OdexError::NoEntityContainer)?;

        debug!(
            namespace = %namespace,
            entities = entities.len(),
            entity_sets = container.entity_set.len(),
            association_sets = container.association_set.len(),
            "indexed metadata"
        );

        Ok(Self {
            namespace,
            entities,
            complex_types,
            associations,
            entity_sets: container.entity_set,
            association_sets: container.association_set,
            annotations,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn entity_types(&self) -> &[EntityType] {
        &self.entities
    }

    pub fn entity_sets(&self) -> &[EntitySet] {
        &self.entity_sets
    }

    pub fn entity(&self, id: EntityId) -> Result<&EntityType> {
        self.entities
            .get(id)
            .ok_or(OdexError::InvalidEntityId(id))
    }

    /// `Product` for both `Product` and `ODataDemo.Product`.
    pub fn local_name<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name)
    }

    pub fn qualify(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<EntityId> {
        let local = self.local_name(name);
        self.entities.iter().position(|e| e.name == local)
    }

    /// Resolve an entity type name (bare or qualified) or an entity set name.
    pub fn resolve_entity(&self, name: &str) -> Result<EntityId> {
        let name = name.trim();
        if let Some(id) = self.entity_by_name(name) {
            return Ok(id);
        }
        self.entity_sets
            .iter()
            .find(|set| set.name == name)
            .and_then(|set| self.entity_by_name(&set.entity_type))
            .ok_or_else(|| OdexError::EntityNotFound(name.to_string()))
    }

    pub fn base_entity(&self, id: EntityId) -> Result<Option<EntityId>> {
        let entity = self.entity(id)?;
        match &entity.base_type {
            None => Ok(None),
            Some(base) => self
                .entity_by_name(base)
                .map(Some)
                .ok_or_else(|| OdexError::InvalidInheritance(entity.name.clone())),
        }
    }

    /// Ancestors from the direct base class up to the root.
    pub fn ancestors(&self, id: EntityId) -> Result<Vec<EntityId>> {
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(base) = self.base_entity(current)? {
            if base == id || chain.contains(&base) {
                return Err(OdexError::InvalidInheritance(self.entity(id)?.name.clone()));
            }
            chain.push(base);
            current = base;
        }
        Ok(chain)
    }

    pub fn root_entity(&self, id: EntityId) -> Result<EntityId> {
        Ok(self.ancestors(id)?.last().copied().unwrap_or(id))
    }

    pub fn inheritance_depth(&self, id: EntityId, skip_abstract: bool) -> Result<usize> {
        let ancestors = self.ancestors(id)?;
        if !skip_abstract {
            return Ok(ancestors.len());
        }
        let mut depth = 0;
        for ancestor in ancestors {
            if !self.entity(ancestor)?.r#abstract {
                depth += 1;
            }
        }
        Ok(depth)
    }

    /// Non-abstract entities in hierarchy order: siblings sorted by name, each
    /// entity followed by its descendants.
    pub fn entity_listing(&self) -> Result<Vec<EntityEntry>> {
        let mut children: Vec<Vec<EntityId>> = vec![Vec::new(); self.entities.len()];
        let mut roots = Vec::new();
        for id in 0..self.entities.len() {
            match self.base_entity(id)? {
                Some(base) => children[base].push(id),
                None => roots.push(id),
            }
        }

        let by_name = |a: &EntityId, b: &EntityId| self.entities[*a].name.cmp(&self.entities[*b].name);
        roots.sort_by(by_name);
        for list in &mut children {
            list.sort_by(by_name);
        }

        let mut entries = Vec::new();
        let mut stack: Vec<EntityId> = roots.into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            let entity = &self.entities[id];
            if !entity.r#abstract {
                let padding = self.inheritance_depth(id, true)?;
                entries.push(EntityEntry {
                    id,
                    name: entity.name.clone(),
                    display_name: format!("{}{}", LISTING_PADDING.repeat(padding), entity.name),
                    depth: padding,
                    base_type: entity.base_type.clone(),
                });
            }
            stack.extend(children[id].iter().rev());
        }
        Ok(entries)
    }

    fn lineage(&self, id: EntityId) -> Result<Vec<EntityId>> {
        let mut lineage = vec![id];
        lineage.extend(self.ancestors(id)?);
        Ok(lineage)
    }

    /// Own properties followed by the base classes' properties.
    pub fn properties(&self, id: EntityId) -> Result<Vec<&Property>> {
        let mut props = Vec::new();
        for entity in self.lineage(id)? {
            props.extend(self.entities[entity].property.iter());
        }
        Ok(props)
    }

    pub fn navigation_properties(&self, id: EntityId) -> Result<Vec<&NavigationProperty>> {
        let mut navs = Vec::new();
        for entity in self.lineage(id)? {
            navs.extend(self.entities[entity].navigation_property.iter());
        }
        Ok(navs)
    }

    pub fn property_items(&self, id: EntityId) -> Result<Vec<QueryItem>> {
        let mut items: Vec<QueryItem> = self
            .properties(id)?
            .into_iter()
            .enumerate()
            .map(|(index, prop)| QueryItem {
                id: index,
                name: prop.name.clone(),
                kind: ItemKind::Property,
                edm_type: Some(prop.edm_type.clone()),
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    pub fn navigation_items(&self, id: EntityId) -> Result<Vec<QueryItem>> {
        let offset = self.properties(id)?.len();
        let mut items: Vec<QueryItem> = self
            .navigation_properties(id)?
            .into_iter()
            .enumerate()
            .map(|(index, nav)| QueryItem {
                id: offset + index,
                name: nav.name.clone(),
                kind: ItemKind::NavigationProperty,
                edm_type: None,
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    pub fn query_items(&self, id: EntityId) -> Result<Vec<QueryItem>> {
        let mut items = self.property_items(id)?;
        items.extend(self.navigation_items(id)?);
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    pub fn query_item(&self, id: EntityId, item: ItemId) -> Result<QueryItem> {
        let props = self.properties(id)?;
        if let Some(prop) = props.get(item) {
            return Ok(QueryItem {
                id: item,
                name: prop.name.clone(),
                kind: ItemKind::Property,
                edm_type: Some(prop.edm_type.clone()),
            });
        }
        let nav = self.navigation_property(id, item)?;
        Ok(QueryItem {
            id: item,
            name: nav.name.clone(),
            kind: ItemKind::NavigationProperty,
            edm_type: None,
        })
    }

    /// Look an item up by name. Own members shadow inherited ones.
    pub fn find_item(&self, id: EntityId, name: &str) -> Result<QueryItem> {
        let name = name.trim();
        let props = self.properties(id)?;
        if let Some(index) = props.iter().position(|p| p.name == name) {
            return self.query_item(id, index);
        }
        let navs = self.navigation_properties(id)?;
        if let Some(index) = navs.iter().position(|n| n.name == name) {
            return self.query_item(id, props.len() + index);
        }
        Err(OdexError::ItemNotFound {
            entity: self.entity(id)?.name.clone(),
            name: name.to_string(),
        })
    }

    pub fn property(&self, id: EntityId, item: ItemId) -> Result<&Property> {
        let props = self.properties(id)?;
        match props.get(item) {
            Some(prop) => Ok(*prop),
            None => {
                let navs = self.navigation_properties(id)?;
                match item.checked_sub(props.len()).and_then(|i| navs.get(i)) {
                    Some(nav) => Err(OdexError::NotAProperty(nav.name.clone())),
                    None => Err(self.invalid_item(id, item)),
                }
            }
        }
    }

    pub fn navigation_property(&self, id: EntityId, item: ItemId) -> Result<&NavigationProperty> {
        let props = self.properties(id)?;
        if let Some(prop) = props.get(item) {
            return Err(OdexError::NotANavigationProperty(prop.name.clone()));
        }
        let navs = self.navigation_properties(id)?;
        navs.get(item - props.len())
            .copied()
            .ok_or_else(|| self.invalid_item(id, item))
    }

    fn invalid_item(&self, id: EntityId, item: ItemId) -> OdexError {
        OdexError::InvalidItemId {
            entity: self
                .entities
                .get(id)
                .map(|e| e.name.clone())
                .unwrap_or_default(),
            item,
        }
    }

    pub fn filter_family(&self, id: EntityId, item: ItemId) -> Result<FilterFamily> {
        Ok(FilterFamily::for_edm_type(&self.property(id, item)?.edm_type))
    }

    fn association_set_for(&self, nav: &NavigationProperty) -> Result<&AssociationSet> {
        // Later declarations shadow earlier ones.
        self.association_sets
            .iter()
            .rev()
            .find(|set| set.association == nav.relationship)
            .ok_or_else(|| OdexError::UnresolvedNavigation(nav.name.clone()))
    }

    /// Multiplicity of the far end of `nav`, looked up through its association set.
    pub fn multiplicity(&self, nav: &NavigationProperty) -> Result<Multiplicity> {
        let set = self.association_set_for(nav)?;
        let association = self
            .associations
            .iter()
            .find(|a| self.qualify(&a.name) == set.association)
            .ok_or_else(|| OdexError::UnresolvedNavigation(nav.name.clone()))?;
        association
            .end
            .iter()
            .find(|end| end.role == nav.to_role)
            .map(|end| end.multiplicity)
            .ok_or_else(|| OdexError::UnresolvedNavigation(nav.name.clone()))
    }

    /// Entity reached by following `nav`, resolved through the entity set bound
    /// to the target role.
    pub fn target_entity(&self, nav: &NavigationProperty) -> Result<EntityId> {
        let set = self.association_set_for(nav)?;
        let entity_set = set
            .end
            .iter()
            .find(|end| end.role == nav.to_role)
            .and_then(|end| self.entity_sets.iter().rev().find(|s| s.name == end.entity_set))
            .ok_or_else(|| OdexError::UnresolvedNavigation(nav.name.clone()))?;
        self.entity_by_name(&entity_set.entity_type)
            .ok_or_else(|| OdexError::UnresolvedNavigation(nav.name.clone()))
    }

    pub fn navigation_target(&self, id: EntityId, item: ItemId) -> Result<EntityId> {
        self.target_entity(self.navigation_property(id, item)?)
    }

    pub fn entity_set_name(&self, id: EntityId) -> Result<Option<&str>> {
        let qualified = self.qualify(&self.entity(id)?.name);
        Ok(self
            .entity_sets
            .iter()
            .rev()
            .find(|set| set.entity_type == qualified)
            .map(|set| set.name.as_str()))
    }

    /// The resource path for an entity.
    ///
    /// Derived types are addressed through the root's entity set with a type
    /// cast (`Products/ODataDemo.FeaturedProduct`); intermediate classes never
    /// appear in the URL. Under an abstract root the entity's own set wins
    /// when it has one.
    pub fn entity_query_name(&self, id: EntityId) -> Result<String> {
        let entity = self.entity(id)?;
        let own_set = self.entity_set_name(id)?;
        if entity.base_type.is_some() {
            let root = self.root_entity(id)?;
            let prefer_own = self.entity(root)?.r#abstract && own_set.is_some();
            if !prefer_own && let Some(set) = self.entity_set_name(root)? {
                return Ok(format!("{}/{}", set, self.qualify(&entity.name)));
            }
        }
        own_set
            .map(str::to_string)
            .ok_or_else(|| OdexError::NoEntitySet(entity.name.clone()))
    }

    /// Key property names; derived types inherit the closest declared key.
    pub fn keys(&self, id: EntityId) -> Result<Vec<&str>> {
        for entity in self.lineage(id)? {
            if let Some(key) = &self.entities[entity].key {
                return Ok(key.property_ref.iter().map(|r| r.name.as_str()).collect());
            }
        }
        Ok(Vec::new())
    }

    pub fn description(&self, id: EntityId) -> Result<Option<&str>> {
        let target = self.qualify(&self.entity(id)?.name);
        Ok(self
            .annotations
            .iter()
            .filter(|a| a.target == target)
            .flat_map(|a| a.value_annotation.iter())
            .find(|v| v.term == DESCRIPTION_TERM)
            .and_then(|v| v.string.as_deref()))
    }

    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        let local = self.local_name(name);
        self.complex_types.iter().find(|c| c.name == local)
    }

    /// Turn `["Category", "Name"]` into path steps starting at `entity`.
    pub fn resolve_path<S: AsRef<str>>(&self, entity: EntityId, names: &[S]) -> Result<Vec<PathStep>> {
        if names.is_empty() {
            return Err(OdexError::EmptyPath);
        }
        let mut steps = Vec::with_capacity(names.len());
        let mut current = entity;
        for (index, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let item = self.find_item(current, name)?;
            steps.push(PathStep {
                entity: current,
                item: item.id,
            });
            let is_last = index + 1 == names.len();
            match (item.kind, is_last) {
                (ItemKind::Property, true) => {}
                (ItemKind::Property, false) => {
                    return Err(OdexError::NotANavigationProperty(item.name));
                }
                (ItemKind::NavigationProperty, true) => {
                    return Err(OdexError::NotAProperty(item.name));
                }
                (ItemKind::NavigationProperty, false) => {
                    current = self.navigation_target(current, item.id)?;
                }
            }
        }
        debug!(entity, steps = steps.len(), "resolved filter path");
        Ok(steps)
    }

    /// Names and multiplicities along a path. Every step but the last must be
    /// a navigation whose target is the next step's entity; the last must be
    /// a property.
    pub fn describe_path(&self, steps: &[PathStep]) -> Result<Vec<PathSegment>> {
        let Some((leaf, hops)) = steps.split_last() else {
            return Err(OdexError::EmptyPath);
        };
        let mut segments = Vec::with_capacity(steps.len());
        for (index, step) in hops.iter().enumerate() {
            let nav = self.navigation_property(step.entity, step.item)?;
            let target = self.target_entity(nav)?;
            let next = steps[index + 1].entity;
            if target != next {
                warn!(
                    navigation = %nav.name,
                    expected = target,
                    found = next,
                    "filter path does not follow its navigation target"
                );
                return Err(OdexError::UnresolvedNavigation(nav.name.clone()));
            }
            segments.push(PathSegment {
                name: nav.name.clone(),
                collection: self.multiplicity(nav)?.is_collection(),
            });
        }
        let prop = self.property(leaf.entity, leaf.item)?;
        segments.push(PathSegment {
            name: prop.name.clone(),
            collection: false,
        });
        Ok(segments)
    }

    /// The property a path ends in.
    pub fn leaf_property(&self, steps: &[PathStep]) -> Result<&Property> {
        let leaf = steps.last().ok_or(OdexError::EmptyPath)?;
        self.property(leaf.entity, leaf.item)
    }
}

/// Split `Category/Name` into its segments, ignoring empty ones.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Catalog;
    use crate::model::Metadata;

    pub const DEMO: &str = include_str!("../tests/fixtures/odata_demo.json");
    pub const INVENTORY: &str = include_str!("../tests/fixtures/inventory.json");

    pub fn demo() -> Catalog {
        Catalog::new(Metadata::from_json_str(DEMO).unwrap()).unwrap()
    }

    pub fn inventory() -> Catalog {
        Catalog::new(Metadata::from_json_str(INVENTORY).unwrap()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{demo, inventory};
    use super::*;

    fn id(catalog: &Catalog, name: &str) -> EntityId {
        catalog.resolve_entity(name).unwrap()
    }

    #[test]
    fn indexes_demo_schema() {
        let catalog = demo();
        assert_eq!(catalog.namespace(), "ODataDemo");
        assert_eq!(catalog.entity_types().len(), 5);
        assert_eq!(catalog.entity_sets().len(), 4);
    }

    #[test]
    fn picks_default_container_across_schemas() {
        let catalog = inventory();
        assert_eq!(catalog.namespace(), "Inventory");
        assert!(catalog.entity_sets().iter().any(|s| s.name == "Sites"));
        assert!(!catalog.entity_sets().iter().any(|s| s.name == "StagedItems"));
    }

    #[test]
    fn missing_container_is_rejected() {
        let raw = r#"{"dataServices":{"schema":[{"namespace":"N","entityType":[{"name":"A"}]}]}}"#;
        let err = Catalog::new(Metadata::from_json_str(raw).unwrap()).unwrap_err();
        assert!(matches!(err, OdexError::NoEntityContainer));
    }

    #[test]
    fn resolves_entities_by_type_qualified_or_set_name() {
        let catalog = demo();
        assert_eq!(id(&catalog, "Category"), 3);
        assert_eq!(id(&catalog, "ODataDemo.Category"), 3);
        assert_eq!(id(&catalog, "Categories"), 3);
        assert!(matches!(
            catalog.resolve_entity("Nope"),
            Err(OdexError::EntityNotFound(_))
        ));
    }

    #[test]
    fn inherited_members_follow_own_members() {
        let catalog = demo();
        let featured = id(&catalog, "FeaturedProduct");
        let props: Vec<_> = catalog
            .properties(featured)
            .unwrap()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(props.len(), 7);
        assert_eq!(props[0], "ID");

        let navs: Vec<_> = catalog
            .navigation_properties(featured)
            .unwrap()
            .iter()
            .map(|n| n.name.clone())
            .collect();
        assert_eq!(navs, vec!["Advertisement", "Category", "Supplier"]);
    }

    #[test]
    fn navigation_item_ids_follow_property_ids() {
        let catalog = demo();
        let product = id(&catalog, "Product");
        let navs = catalog.navigation_items(product).unwrap();
        assert_eq!(navs[0].name, "Category");
        assert_eq!(navs[0].id, 7);
        assert_eq!(navs[1].name, "Supplier");
        assert_eq!(navs[1].id, 8);

        let nav = catalog.navigation_property(product, 8).unwrap();
        assert_eq!(nav.name, "Supplier");
        assert!(matches!(
            catalog.navigation_property(product, 0),
            Err(OdexError::NotANavigationProperty(_))
        ));
        assert!(matches!(
            catalog.property(product, 7),
            Err(OdexError::NotAProperty(_))
        ));
        assert!(matches!(
            catalog.query_item(product, 42),
            Err(OdexError::InvalidItemId { .. })
        ));
    }

    #[test]
    fn query_items_are_sorted_by_name() {
        let catalog = demo();
        let names: Vec<_> = catalog
            .query_items(id(&catalog, "Category"))
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["ID", "Name", "Products"]);
    }

    #[test]
    fn multiplicity_comes_from_the_target_role() {
        let catalog = demo();
        let product = id(&catalog, "Product");
        let category = id(&catalog, "Category");

        let to_category = catalog.navigation_property(product, 7).unwrap();
        assert_eq!(catalog.multiplicity(to_category).unwrap(), Multiplicity::ZeroOrOne);

        let to_products = catalog.navigation_property(category, 2).unwrap();
        assert_eq!(catalog.multiplicity(to_products).unwrap(), Multiplicity::Many);
        assert_eq!(catalog.target_entity(to_products).unwrap(), product);
    }

    #[test]
    fn unknown_relationship_is_unresolved() {
        let catalog = demo();
        let nav = NavigationProperty {
            name: "Ghost".into(),
            relationship: "ODataDemo.Nothing".into(),
            from_role: "a".into(),
            to_role: "b".into(),
        };
        assert!(matches!(
            catalog.multiplicity(&nav),
            Err(OdexError::UnresolvedNavigation(_))
        ));
    }

    #[test]
    fn derived_entities_are_addressed_through_the_root_set() {
        let catalog = demo();
        assert_eq!(
            catalog.entity_query_name(id(&catalog, "FeaturedProduct")).unwrap(),
            "Products/ODataDemo.FeaturedProduct"
        );
        assert_eq!(
            catalog.entity_query_name(id(&catalog, "Category")).unwrap(),
            "Categories"
        );

        let inv = inventory();
        assert_eq!(
            inv.entity_query_name(id(&inv, "Server")).unwrap(),
            "Items/Inventory.Server"
        );
    }

    fn catalog_from(entity_types: &str, entity_sets: &str) -> Catalog {
        let raw = format!(
            r#"{{"dataServices":{{"schema":[{{"namespace":"N","entityType":{entity_types},
            "entityContainer":[{{"name":"C","isDefaultEntityContainer":"true","entitySet":{entity_sets}}}]}}]}}}}"#
        );
        Catalog::new(Metadata::from_json_str(&raw).unwrap()).unwrap()
    }

    #[test]
    fn abstract_root_defers_to_own_entity_set() {
        let catalog = catalog_from(
            r#"[{"name":"Item","abstract":"true"},
                {"name":"Server","baseType":"N.Item"},
                {"name":"Widget","baseType":"N.Item"}]"#,
            r#"[{"name":"Items","entityType":"N.Item"},{"name":"Servers","entityType":"N.Server"}]"#,
        );
        assert_eq!(catalog.entity_query_name(id(&catalog, "Server")).unwrap(), "Servers");
        assert_eq!(
            catalog.entity_query_name(id(&catalog, "Widget")).unwrap(),
            "Items/N.Widget"
        );
    }

    #[test]
    fn unexposed_root_falls_back_to_own_set() {
        let catalog = catalog_from(
            r#"[{"name":"Thing"},{"name":"Gadget","baseType":"N.Thing"}]"#,
            r#"[{"name":"Gadgets","entityType":"N.Gadget"}]"#,
        );
        assert_eq!(catalog.entity_query_name(id(&catalog, "Gadget")).unwrap(), "Gadgets");
        assert!(matches!(
            catalog.entity_query_name(id(&catalog, "Thing")),
            Err(OdexError::NoEntitySet(name)) if name == "Thing"
        ));
    }

    #[test]
    fn last_entity_set_declaration_wins() {
        let catalog = catalog_from(
            r#"[{"name":"Thing"}]"#,
            r#"[{"name":"OldThings","entityType":"N.Thing"},{"name":"Things","entityType":"N.Thing"}]"#,
        );
        let thing = id(&catalog, "Thing");
        assert_eq!(catalog.entity_set_name(thing).unwrap(), Some("Things"));
        assert_eq!(catalog.entity_query_name(thing).unwrap(), "Things");
    }

    #[test]
    fn listing_skips_abstract_and_pads_descendants() {
        let catalog = inventory();
        let listing = catalog.entity_listing().unwrap();
        let names: Vec<_> = listing.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Device",
                ". . Laptop",
                ". . Server",
                "Port",
                "Region",
                "Site",
            ]
        );
        assert_eq!(catalog.inheritance_depth(id(&catalog, "Server"), false).unwrap(), 2);
        assert_eq!(catalog.inheritance_depth(id(&catalog, "Server"), true).unwrap(), 1);
    }

    #[test]
    fn demo_listing_nests_featured_product() {
        let catalog = demo();
        let names: Vec<_> = catalog
            .entity_listing()
            .unwrap()
            .into_iter()
            .map(|e| e.display_name)
            .collect();
        assert_eq!(
            names,
            vec!["Advertisement", "Category", "Product", ". . FeaturedProduct", "Supplier"]
        );
    }

    #[test]
    fn derived_types_inherit_keys() {
        let catalog = inventory();
        assert_eq!(catalog.keys(id(&catalog, "Server")).unwrap(), vec!["ID"]);
    }

    #[test]
    fn cyclic_inheritance_is_reported() {
        let raw = r#"{"dataServices":{"schema":[{"namespace":"N",
            "entityType":[{"name":"A","baseType":"N.B"},{"name":"B","baseType":"N.A"}],
            "entityContainer":[{"name":"C","entitySet":[]}]}]}}"#;
        let catalog = Catalog::new(Metadata::from_json_str(raw).unwrap()).unwrap();
        assert!(matches!(
            catalog.ancestors(0),
            Err(OdexError::InvalidInheritance(_))
        ));
    }

    #[test]
    fn resolve_path_follows_navigation_targets() {
        let catalog = demo();
        let product = id(&catalog, "Product");
        let steps = catalog.resolve_path(product, &["Category", "Name"]).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].entity, id(&catalog, "Category"));

        let segments = catalog.describe_path(&steps).unwrap();
        assert_eq!(
            segments,
            vec![
                PathSegment { name: "Category".into(), collection: false },
                PathSegment { name: "Name".into(), collection: false },
            ]
        );
        assert_eq!(catalog.leaf_property(&steps).unwrap().edm_type, "Edm.String");
    }

    #[test]
    fn resolve_path_rejects_misplaced_kinds() {
        let catalog = demo();
        let product = id(&catalog, "Product");
        assert!(matches!(
            catalog.resolve_path(product, &["Name", "ID"]),
            Err(OdexError::NotANavigationProperty(_))
        ));
        assert!(matches!(
            catalog.resolve_path(product, &["Category"]),
            Err(OdexError::NotAProperty(_))
        ));
        assert!(matches!(
            catalog.resolve_path::<&str>(product, &[]),
            Err(OdexError::EmptyPath)
        ));
    }

    #[test]
    fn describe_path_rejects_disconnected_steps() {
        let catalog = demo();
        let product = id(&catalog, "Product");
        let steps = vec![
            PathStep { entity: product, item: 7 },
            PathStep { entity: id(&catalog, "Supplier"), item: 1 },
        ];
        assert!(matches!(
            catalog.describe_path(&steps),
            Err(OdexError::UnresolvedNavigation(_))
        ));
    }

    #[test]
    fn reads_description_annotation() {
        let catalog = demo();
        assert_eq!(
            catalog.description(id(&catalog, "Product")).unwrap(),
            Some("All Products available in the online store")
        );
        assert_eq!(catalog.description(id(&catalog, "Category")).unwrap(), None);
    }

    #[test]
    fn finds_complex_types() {
        let catalog = demo();
        let address = catalog.complex_type("ODataDemo.Address").unwrap();
        assert_eq!(address.property.len(), 5);
    }

    #[test]
    fn split_path_ignores_empty_segments() {
        assert_eq!(split_path(" Category / Name "), vec!["Category", "Name"]);
        assert_eq!(split_path("/Name/"), vec!["Name"]);
    }
}
