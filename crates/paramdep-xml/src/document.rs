//! Whole documents: a parameter list, its validators, and its dependency sheet.
//!
//! ```xml
//! <ParameterList name="Solver">
//!   <Parameter id="0" name="mode" type="string" value="auto"/>
//!   <Parameter id="1" name="weights" type="Array(double)"><Item value="0.5"/></Parameter>
//!   <Validators>…</Validators>
//!   <Dependencies name="Solver dependencies">…</Dependencies>
//! </ParameterList>
//! ```
//!
//! Reading is staged: validators first, then parameters (which may reference
//! validators), then dependencies (which reference both by ID).

use std::fs;
use std::path::Path;
use std::sync::Arc;

use paramdep_model::{ConfigEntry, DependencySheet, ParameterList, ValueType};
use tracing::{debug, info, info_span, warn};

use crate::dependencies::{ConverterRegistry, DEPENDENCIES_TAG, DEPENDENCY_TAG};
use crate::element::XmlElement;
use crate::error::{Reference, Result, XmlError};
use crate::ids::{EntryIdMap, IdToEntryMap, IdToValidatorMap, ValidatorIdMap};
use crate::validators::{VALIDATORS_TAG, validators_from_xml, validators_to_xml};

pub const PARAMETER_LIST_TAG: &str = "ParameterList";
pub const PARAMETER_TAG: &str = "Parameter";
const ITEM_TAG: &str = "Item";

/// What to do when one dependency element fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Fail the whole document.
    #[default]
    Abort,
    /// Log the failure, leave the dependency out, and continue.
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub failure_policy: FailurePolicy,
    /// Converters to dispatch with; the standard registry when `None`.
    pub registry: Option<Arc<ConverterRegistry>>,
}

impl ReadOptions {
    pub fn skip_failures() -> Self {
        Self {
            failure_policy: FailurePolicy::Skip,
            ..Self::default()
        }
    }

    pub fn registry(&self) -> &ConverterRegistry {
        match self.registry.as_deref() {
            Some(registry) => registry,
            None => ConverterRegistry::standard(),
        }
    }
}

/// A dependency element left out under [`FailurePolicy::Skip`].
#[derive(Debug)]
pub struct SkippedDependency {
    /// Position among the `<Dependency>` elements.
    pub index: usize,
    pub dependency_type: Option<String>,
    pub error: XmlError,
}

/// A fully loaded document.
#[derive(Debug)]
pub struct Document {
    pub list: ParameterList,
    pub sheet: DependencySheet,
    pub skipped: Vec<SkippedDependency>,
}

/// Encode `list` and `sheet` with the standard converters.
pub fn write_document(list: &ParameterList, sheet: &DependencySheet) -> Result<XmlElement> {
    write_document_with(list, sheet, ConverterRegistry::standard())
}

pub fn write_document_with(
    list: &ParameterList,
    sheet: &DependencySheet,
    registry: &ConverterRegistry,
) -> Result<XmlElement> {
    let entry_ids = EntryIdMap::from_list(list);
    let validator_ids = ValidatorIdMap::collect(list, sheet);

    let mut root = XmlElement::new(PARAMETER_LIST_TAG).with_attribute("name", list.name());
    // Same numbering as `EntryIdMap::from_list`.
    for ((_, entry), id) in list.iter().zip(0_u32..) {
        root.push_child(parameter_to_xml(entry, id, &validator_ids)?);
    }
    if !validator_ids.is_empty() {
        root.push_child(validators_to_xml(&validator_ids)?);
    }
    let mut dependencies = XmlElement::new(DEPENDENCIES_TAG).with_attribute("name", sheet.name());
    for dependency in sheet {
        dependencies.push_child(registry.convert_dependency(
            dependency,
            &entry_ids,
            &validator_ids,
        )?);
    }
    root.push_child(dependencies);
    debug!(
        parameters = list.len(),
        validators = validator_ids.len(),
        dependencies = sheet.len(),
        "encoded document"
    );
    Ok(root)
}

fn parameter_to_xml(
    entry: &ConfigEntry,
    id: u32,
    validators: &ValidatorIdMap,
) -> Result<XmlElement> {
    let mut element = XmlElement::new(PARAMETER_TAG)
        .with_attribute("id", id)
        .with_attribute("name", entry.name())
        .with_attribute("type", entry.value_type());
    match entry.value().as_array() {
        Some(array) => {
            for item in array.item_strings() {
                element.push_child(XmlElement::new(ITEM_TAG).with_attribute("value", item));
            }
        }
        None => element.set_attribute("value", entry.value()),
    }
    if let Some(validator) = entry.validator() {
        let validator_id = validators
            .id(validator)
            .ok_or_else(|| XmlError::MissingValidator {
                dependency_type: PARAMETER_TAG.to_string(),
                reference: Reference::Validator(validator.to_string()),
            })?;
        element.set_attribute("validatorId", validator_id);
    }
    if let Some(doc) = entry.doc() {
        element.set_attribute("docString", doc);
    }
    Ok(element)
}

/// Decode a document with default options.
pub fn read_document(root: &XmlElement) -> Result<Document> {
    read_document_with(root, &ReadOptions::default())
}

pub fn read_document_with(root: &XmlElement, options: &ReadOptions) -> Result<Document> {
    root.expect_tag(PARAMETER_LIST_TAG)?;
    let name = root.attribute("name").unwrap_or_default();
    let span = info_span!("read_document", list = name);
    let _guard = span.enter();

    for child in root.children() {
        match child.tag() {
            PARAMETER_TAG | VALIDATORS_TAG | DEPENDENCIES_TAG => {}
            other => {
                return Err(XmlError::unexpected(
                    "<Parameter>, <Validators> or <Dependencies>",
                    format!("<{other}>"),
                ));
            }
        }
    }

    let validators = match root.child(VALIDATORS_TAG) {
        Some(block) => validators_from_xml(block)?,
        None => IdToValidatorMap::new(),
    };

    let mut list = ParameterList::new(name);
    let mut entries = IdToEntryMap::new();
    for element in root.children_named(PARAMETER_TAG) {
        let (id, entry) = parameter_from_xml(element, &validators)?;
        let key = list.insert(entry)?;
        entries.insert(id, key)?;
    }

    let (sheet, skipped) = match root.child(DEPENDENCIES_TAG) {
        Some(block) => dependencies_from_xml(block, &entries, &validators, options)?,
        None => (DependencySheet::new(""), Vec::new()),
    };
    info!(
        parameters = list.len(),
        validators = validators.len(),
        dependencies = sheet.len(),
        skipped = skipped.len(),
        "loaded document"
    );
    Ok(Document {
        list,
        sheet,
        skipped,
    })
}

fn parameter_from_xml(
    element: &XmlElement,
    validators: &IdToValidatorMap,
) -> Result<(u32, ConfigEntry)> {
    let id: u32 = element.parse_attribute("id")?;
    let name = element.require_attribute("name")?;
    let value_type: ValueType = element.parse_attribute("type")?;
    let value = if value_type.is_array() {
        let items = element
            .children_named(ITEM_TAG)
            .map(|item| item.require_attribute("value"))
            .collect::<Result<Vec<_>>>()?;
        value_type
            .parse_array(items)
            .map_err(|err| element.invalid_attribute("type", value_type.as_str(), err))?
    } else {
        let text = element.require_attribute("value")?;
        value_type
            .parse_scalar(text)
            .map_err(|err| element.invalid_attribute("value", text, err))?
    };
    let mut entry = ConfigEntry::new(name, value);
    if let Some(validator_id) = element.parse_optional_attribute::<u32>("validatorId")? {
        let validator = validators
            .get(validator_id)
            .ok_or_else(|| XmlError::MissingValidator {
                dependency_type: PARAMETER_TAG.to_string(),
                reference: Reference::Id(validator_id),
            })?;
        entry = entry.with_validator(Arc::clone(validator));
    }
    if let Some(doc) = element.attribute("docString") {
        entry = entry.with_doc(doc);
    }
    Ok((id, entry))
}

/// Decode a `<Dependencies>` block against ID maps from an earlier load.
///
/// Under [`FailurePolicy::Abort`] the first failure is returned and no sheet
/// is produced.
pub fn dependencies_from_xml(
    block: &XmlElement,
    entries: &IdToEntryMap,
    validators: &IdToValidatorMap,
    options: &ReadOptions,
) -> Result<(DependencySheet, Vec<SkippedDependency>)> {
    block.expect_tag(DEPENDENCIES_TAG)?;
    let registry = options.registry();
    let mut sheet = DependencySheet::new(block.attribute("name").unwrap_or_default());
    let mut skipped = Vec::new();
    for (index, element) in block.children().iter().enumerate() {
        let decoded = element
            .expect_tag(DEPENDENCY_TAG)
            .and_then(|()| registry.convert_xml(element, entries, validators));
        match (decoded, options.failure_policy) {
            (Ok(dependency), _) => {
                sheet.add_dependency(Arc::new(dependency));
            }
            (Err(error), FailurePolicy::Abort) => return Err(error),
            (Err(error), FailurePolicy::Skip) => {
                let dependency_type = element.attribute("type").map(str::to_string);
                warn!(index, ?dependency_type, %error, "skipping dependency");
                skipped.push(SkippedDependency {
                    index,
                    dependency_type,
                    error,
                });
            }
        }
    }
    Ok((sheet, skipped))
}

/// Encode to document text.
pub fn to_string(list: &ParameterList, sheet: &DependencySheet) -> Result<String> {
    write_document(list, sheet)?.to_xml_string()
}

/// Decode document text.
pub fn from_str(xml: &str, options: &ReadOptions) -> Result<Document> {
    read_document_with(&XmlElement::parse(xml)?, options)
}

pub fn write_file(path: &Path, list: &ParameterList, sheet: &DependencySheet) -> Result<()> {
    let text = to_string(list, sheet)?;
    fs::write(path, text).map_err(|source| XmlError::File {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_file(path: &Path, options: &ReadOptions) -> Result<Document> {
    let text = fs::read_to_string(path).map_err(|source| XmlError::File {
        path: path.to_path_buf(),
        source,
    })?;
    from_str(&text, options)
}
