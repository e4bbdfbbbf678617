use crate::error::AdapterError;
use crate::memory::matcher::{relation, Matcher, Relation};
use rdf_entity_model::{
    Entity, FindOptions, FindOptionsRelations, FindOptionsSelect, Node, Properties, SelectValue,
    Value, ID_KEY, TYPE_KEY,
};

/// Shapes matched entities like the graph adapter frames its answers: with embedded relations or projected to a
/// selection.
pub(crate) struct Framer<'a> {
    matcher: Matcher<'a>,
}

impl<'a> Framer<'a> {
    pub(crate) fn new(matcher: Matcher<'a>) -> Self {
        Self { matcher }
    }

    /// Frames a page of matched entities. `skip_framing` returns them flat, followed by their related entities.
    pub(crate) fn frame(
        &self,
        page: &[&'a Entity],
        options: &FindOptions,
    ) -> Result<Vec<Entity>, AdapterError> {
        if options.skip_framing {
            return self.flat(page, options.relations.as_ref());
        }
        page.iter()
            .map(|entity| match (&options.select, &options.relations) {
                (Some(select), _) => Ok(self.project(entity, select, true)),
                (None, Some(relations)) => self.embed(entity, relations, &mut Vec::new()),
                (None, None) => Ok((*entity).clone()),
            })
            .collect()
    }

    fn flat(
        &self,
        page: &[&'a Entity],
        relations: Option<&FindOptionsRelations>,
    ) -> Result<Vec<Entity>, AdapterError> {
        let mut related = Vec::new();
        if let Some(relations) = relations {
            for entity in page {
                self.collect_related(entity, relations, &mut related)?;
            }
        }
        related.sort_by(|a: &&Entity, b| a.id.cmp(&b.id));
        related.dedup_by(|a, b| a.id == b.id);
        related.retain(|entity| !page.iter().any(|root| root.id == entity.id));
        Ok(page.iter().chain(&related).map(|e| (*e).clone()).collect())
    }

    fn collect_related(
        &self,
        entity: &Entity,
        relations: &FindOptionsRelations,
        related: &mut Vec<&'a Entity>,
    ) -> Result<(), AdapterError> {
        for (field, value) in relations.iter() {
            let Some(relation) = relation(field, value)? else {
                continue;
            };
            for target in self.matcher.targets(entity, field, &relation) {
                related.push(target);
                if let Some(nested) = relation.nested() {
                    self.collect_related(target, nested, related)?;
                }
            }
        }
        Ok(())
    }

    /// Replaces the references of the declared relations by the related entities, and adds inverse relations under
    /// their alias.
    fn embed(
        &self,
        entity: &Entity,
        relations: &FindOptionsRelations,
        path: &mut Vec<String>,
    ) -> Result<Entity, AdapterError> {
        path.push(entity.id.clone());
        let mut framed = entity.clone();
        for (field, value) in relations.iter() {
            let Some(relation) = relation(field, value)? else {
                continue;
            };
            match relation {
                Relation::Forward { nested } => {
                    if let Some(value) = framed.properties.remove(field) {
                        let value = self.embed_value(value, nested, path)?;
                        framed.properties.insert(field.to_owned(), value);
                    }
                }
                Relation::Inverse { nested, .. } => {
                    let mut sources = Vec::new();
                    for source in self.matcher.targets(entity, field, &relation) {
                        if !path.contains(&source.id) {
                            sources.push(Value::from(self.embed_entity(source, nested, path)?));
                        }
                    }
                    if !sources.is_empty() {
                        framed
                            .properties
                            .insert(field.to_owned(), single_or_array(sources));
                    }
                }
            }
        }
        path.pop();
        Ok(framed)
    }

    fn embed_entity(
        &self,
        entity: &Entity,
        nested: Option<&FindOptionsRelations>,
        path: &mut Vec<String>,
    ) -> Result<Entity, AdapterError> {
        match nested {
            Some(nested) => self.embed(entity, nested, path),
            None => Ok(entity.clone()),
        }
    }

    fn embed_value(
        &self,
        value: Value,
        nested: Option<&FindOptionsRelations>,
        path: &mut Vec<String>,
    ) -> Result<Value, AdapterError> {
        match value {
            Value::Array(values) => values
                .into_iter()
                .map(|value| self.embed_value(value, nested, path))
                .collect::<Result<_, _>>()
                .map(Value::Array),
            value => {
                let target = value
                    .id()
                    .filter(|id| !path.iter().any(|visited| visited == id))
                    .and_then(|id| self.matcher.get(id));
                match target {
                    Some(target) => Ok(Value::from(self.embed_entity(target, nested, path)?)),
                    None => Ok(value),
                }
            }
        }
    }

    /// Keeps the selected properties. The types are kept at the root unless `type` is selected explicitly.
    fn project(&self, entity: &Entity, select: &FindOptionsSelect, root: bool) -> Entity {
        let (types, properties) = self.project_properties(&entity.types, &entity.properties, select, root);
        Entity {
            id: entity.id.clone(),
            types,
            properties,
        }
    }

    fn project_properties(
        &self,
        types: &[String],
        properties: &Properties,
        select: &FindOptionsSelect,
        root: bool,
    ) -> (Vec<String>, Properties) {
        let keep_types = match select.get(TYPE_KEY) {
            None => root,
            Some(SelectValue::Include(include)) => *include,
            Some(SelectValue::Nested(_)) => true,
        };
        let mut projected = Properties::new();
        for (field, value) in select.iter() {
            if field == ID_KEY || field == TYPE_KEY {
                continue;
            }
            let Some(stored) = properties.get(field) else {
                continue;
            };
            match value {
                SelectValue::Include(false) => {}
                SelectValue::Include(true) => {
                    projected.insert(field.to_owned(), stored.clone());
                }
                SelectValue::Nested(nested) => {
                    projected.insert(field.to_owned(), self.project_value(stored, nested));
                }
            }
        }
        let types = if keep_types { types.to_vec() } else { Vec::new() };
        (types, projected)
    }

    fn project_value(&self, value: &Value, select: &FindOptionsSelect) -> Value {
        match value {
            Value::Array(values) => Value::Array(
                values
                    .iter()
                    .map(|value| self.project_value(value, select))
                    .collect(),
            ),
            Value::Node(node) => {
                let (types, properties) =
                    self.project_properties(&node.types, &node.properties, select, false);
                Value::from(Node { types, properties })
            }
            value => match value.id().and_then(|id| self.matcher.get(id)) {
                Some(target) => Value::from(self.project(target, select, false)),
                None => value.clone(),
            },
        }
    }
}

fn single_or_array(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        if let Some(value) = values.pop() {
            return value;
        }
    }
    Value::Array(values)
}
