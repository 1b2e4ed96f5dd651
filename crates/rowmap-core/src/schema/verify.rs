use super::{ResultMap, ResultMapping, Schema};
use crate::{Error, Result};

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        for result_map in self.schema.result_maps() {
            self.verify_target_type(result_map)?;

            for mapping in result_map.result_mappings() {
                self.verify_mapping(result_map, mapping)?;
            }

            self.verify_discriminator_cases(result_map)?;
        }

        self.verify_statements()?;
        Ok(())
    }

    fn verify_target_type(&self, result_map: &ResultMap) -> Result<()> {
        if let Some(name) = result_map.ty.as_object_name() {
            if self.schema.types.get(name).is_none() {
                return Err(Error::invalid_schema(format!(
                    "result map `{}` targets unknown type `{name}`",
                    result_map.id
                )));
            }
        }
        Ok(())
    }

    fn verify_mapping(&self, result_map: &ResultMap, mapping: &ResultMapping) -> Result<()> {
        let property = mapping.property.as_deref().unwrap_or_default();

        if let Some(nested) = &mapping.nested_result_map_id {
            if self.schema.result_map(nested).is_err() {
                return Err(Error::invalid_schema(format!(
                    "mapping `{property}` of result map `{}` references unknown result map `{nested}`",
                    result_map.id
                )));
            }
        }

        if let Some(query) = &mapping.nested_query_id {
            if self.schema.statement(query).is_err() {
                return Err(Error::invalid_schema(format!(
                    "mapping `{property}` of result map `{}` references unknown statement `{query}`",
                    result_map.id
                )));
            }
        }

        if mapping.result_set.is_some() {
            if mapping.nested_result_map_id.is_none() {
                return Err(Error::invalid_schema(format!(
                    "mapping `{property}` of result map `{}` reads a resultset but has no nested result map",
                    result_map.id
                )));
            }

            let columns = mapping.column.as_deref().map(ResultMapping::split_columns);
            let foreign = mapping
                .foreign_column
                .as_deref()
                .map(ResultMapping::split_columns);

            match (columns, foreign) {
                (Some(columns), Some(foreign)) if columns.len() == foreign.len() => {}
                _ => {
                    return Err(Error::invalid_schema(format!(
                        "mapping `{property}` of result map `{}` must pair each column with a foreign column",
                        result_map.id
                    )));
                }
            }
        }

        if mapping.column.is_none()
            && mapping.nested_result_map_id.is_none()
            && mapping.nested_query_id.is_none()
            && mapping.result_set.is_none()
        {
            return Err(Error::invalid_schema(format!(
                "mapping `{property}` of result map `{}` has no column and nothing nested",
                result_map.id
            )));
        }

        Ok(())
    }

    fn verify_discriminator_cases(&self, result_map: &ResultMap) -> Result<()> {
        let Some(discriminator) = &result_map.discriminator else {
            return Ok(());
        };

        for (value, case) in &discriminator.cases {
            if self.schema.result_map(case).is_err() {
                return Err(Error::invalid_schema(format!(
                    "discriminator case `{value}` of result map `{}` references unknown result map `{case}`",
                    result_map.id
                )));
            }
        }
        Ok(())
    }

    fn verify_statements(&self) -> Result<()> {
        for statement in self.schema.statements() {
            if statement.result_maps.is_empty() {
                return Err(Error::invalid_schema(format!(
                    "statement `{}` has no result map",
                    statement.id
                )));
            }

            for id in &statement.result_maps {
                if self.schema.result_map(id).is_err() {
                    return Err(Error::invalid_schema(format!(
                        "statement `{}` references unknown result map `{id}`",
                        statement.id
                    )));
                }
            }
        }
        Ok(())
    }
}
