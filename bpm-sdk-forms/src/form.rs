//! The form lifecycle orchestrator.
//!
//! load → parse → bind fields → run scripts → fetch variables → merge →
//! restore from storage → apply to controls, then on the way out:
//! retrieve from controls → transform files → submit only what changed.

use crate::constants;
use crate::document::{FilePayload, FormDocument};
use crate::error::FormError;
use crate::fields::{self, Field};
use crate::script::ScriptEngine;
use crate::service::{FormService, FormTarget};
use crate::storage::{storage_key, FormStorage, MemoryStorage, StoredForm};
use crate::typeutil::{self, VariableType};
use crate::variables::{Variable, VariableManager};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bpm_sdk_client::{Emitter, VariableValue};
use chrono::{Local, Offset};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Construction options: the engine seam, the form's target, and the markup
/// (inline, or a URL to fetch it from).
pub struct FormOptions {
    service: Arc<dyn FormService>,
    target: FormTarget,
    form_html: Option<String>,
    form_url: Option<String>,
    storage: Option<Box<dyn FormStorage>>,
    business_key: Option<String>,
}

impl FormOptions {
    pub fn new(service: Arc<dyn FormService>, target: FormTarget) -> Self {
        Self {
            service,
            target,
            form_html: None,
            form_url: None,
            storage: None,
            business_key: None,
        }
    }

    pub fn with_markup(mut self, html: &str) -> Self {
        self.form_html = Some(html.to_owned());
        self
    }

    pub fn with_form_url(mut self, url: &str) -> Self {
        self.form_url = Some(url.to_owned());
        self
    }

    pub fn with_storage(mut self, storage: Box<dyn FormStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_business_key(mut self, key: &str) -> Self {
        self.business_key = Some(key.to_owned());
        self
    }
}

pub struct EngineForm {
    service: Arc<dyn FormService>,
    target: FormTarget,
    document: FormDocument,
    fields: Vec<Field>,
    scripts: ScriptEngine,
    variables: Rc<RefCell<VariableManager>>,
    business_key: Rc<RefCell<Option<String>>>,
    emitter: Emitter,
    storage: Box<dyn FormStorage>,
}

impl EngineForm {
    /// Build the form and run the whole load lifecycle.
    pub async fn initialize(options: FormOptions) -> Result<Self, FormError> {
        let FormOptions {
            service,
            target,
            form_html,
            form_url,
            storage,
            business_key,
        } = options;

        let html = match (form_html, form_url) {
            (Some(html), _) => html,
            (None, Some(url)) => service.load_form(&url).await?,
            (None, None) => return Err(FormError::MissingFormSource),
        };

        let document = FormDocument::parse(&html)?;
        debug!(form = document.form_name(), "form parsed");

        let variables = Rc::new(RefCell::new(VariableManager::new()));
        let fields = fields::bind_fields(&document, &mut variables.borrow_mut())?;
        let business_key = Rc::new(RefCell::new(business_key));
        let scripts = ScriptEngine::new(Rc::clone(&variables), Rc::clone(&business_key))?;

        let mut form = Self {
            service,
            target,
            document,
            fields,
            scripts,
            variables,
            business_key,
            emitter: Emitter::new(),
            storage: storage.unwrap_or_else(|| Box::new(MemoryStorage::new())),
        };

        for script in form.document.scripts().to_vec() {
            form.scripts.execute(&script)?;
        }
        form.fire_event("form-loaded")?;

        form.fetch_and_apply().await?;
        Ok(form)
    }

    async fn fetch_and_apply(&mut self) -> Result<(), FormError> {
        let names = self.variables.borrow().variable_names();
        let fetched = if names.is_empty() {
            BTreeMap::new()
        } else {
            self.service
                .form_variables(&self.target, &names, false)
                .await?
        };

        self.merge_variables(&fetched)?;
        self.store_original_values(&fetched);
        self.fire_event("variables-fetched")?;

        // the lifecycle restore is best-effort; a keyless target simply skips it
        if self.target.storage_id().is_some() {
            self.restore()?;
        }
        self.fire_event("variables-restored")?;

        self.apply_variables()?;
        self.fire_event("variables-applied")?;
        Ok(())
    }

    /// Merge fetched server values over the bound variables. Markup-provided
    /// values win; everything the markup left open is taken from the server.
    fn merge_variables(
        &mut self,
        fetched: &BTreeMap<String, VariableValue>,
    ) -> Result<(), FormError> {
        let mut vars = self.variables.borrow_mut();

        for (name, incoming) in fetched {
            if vars.variable(name).is_none() {
                vars.create_variable(Variable::new(name, None, Value::Null))?;
            }
            let variable = vars
                .variable_mut(name)
                .ok_or_else(|| FormError::UnknownVariable(name.clone()))?;

            if variable.value_type.is_none() {
                variable.value_type = incoming
                    .value_type
                    .as_deref()
                    .map(str::parse)
                    .transpose()?;
            }
            if variable.value.is_null() || variable.value == json!("") {
                variable.value = incoming.value.clone();
            }
            if variable.value_info.is_empty() {
                variable.value_info = incoming.value_info.clone();
            }

            // JSON payloads arrive serialized; the manager holds them deserialized
            if variable.value_type == Some(VariableType::Json) {
                if let Value::String(raw) = &incoming.value {
                    variable.value = serde_json::from_str(raw)
                        .map_err(bpm_sdk_client::EngineError::from)?;
                }
            }

            if matches!(
                variable.value_type,
                Some(VariableType::Bytes) | Some(VariableType::File)
            ) {
                variable.content_url = self.service.content_url(&self.target, name);
            }
        }

        vars.fetched = true;
        Ok(())
    }

    /// Retain the raw server values — dirty checking compares against these.
    fn store_original_values(&mut self, fetched: &BTreeMap<String, VariableValue>) {
        let mut vars = self.variables.borrow_mut();
        for (name, incoming) in fetched {
            vars.set_original_value(name, incoming.value.clone());
        }
    }

    // ─── Storage ──────────────────────────────────────────────

    fn form_id(&self) -> Result<&str, FormError> {
        self.target.storage_id().ok_or(FormError::NoStorageId)
    }

    /// Persist the current control values. Returns false when a `store`
    /// hook vetoed the operation. Binary values are never persisted.
    pub fn store(&mut self) -> Result<bool, FormError> {
        let key = storage_key(self.form_id()?);

        if self.fire_event("store")? {
            return Ok(false);
        }

        self.retrieve_variables()?;

        let vars = self.variables.borrow();
        let stored = StoredForm {
            date: now_ms(),
            vars: vars
                .variables()
                .filter(|v| v.value_type != Some(VariableType::Bytes))
                .map(|v| (v.name.clone(), v.value.clone()))
                .collect(),
        };
        drop(vars);

        let raw = serde_json::to_string(&stored).map_err(bpm_sdk_client::EngineError::from)?;
        self.storage.put(&key, &raw)?;
        self.fire_event("variables-stored")?;
        Ok(true)
    }

    /// Whether a well-formed entry exists for this form.
    pub fn is_restorable(&self) -> Result<bool, FormError> {
        let key = storage_key(self.form_id()?);
        match self.storage.get(&key)? {
            Some(raw) => Ok(serde_json::from_str::<StoredForm>(&raw).is_ok()),
            None => Ok(false),
        }
    }

    /// Merge stored values over the variable manager, creating names that
    /// do not exist yet.
    pub fn restore(&mut self) -> Result<(), FormError> {
        let key = storage_key(self.form_id()?);
        if !self.is_restorable()? {
            return Ok(());
        }

        let raw = self
            .storage
            .get(&key)?
            .unwrap_or_default();
        let stored: StoredForm =
            serde_json::from_str(&raw).map_err(|e| FormError::Storage(e.to_string()))?;

        let mut vars = self.variables.borrow_mut();
        for (name, value) in stored.vars {
            if vars.variable(&name).is_some() {
                vars.set_variable_value(&name, value)?;
            } else {
                vars.create_variable(Variable::new(&name, None, value))?;
            }
        }
        Ok(())
    }

    // ─── Submission ───────────────────────────────────────────

    /// Retrieve, transform files, and submit the changed variables.
    /// Storage for this form is purged on success.
    pub async fn submit(&mut self) -> Result<Value, FormError> {
        if self.fire_event("submit")? {
            self.fire_event("submit-failed")?;
            return Err(FormError::Prevented { action: "submission" });
        }

        self.retrieve_variables()?;
        self.transform_files()?;
        let variables = self.parse_variables()?;
        let business_key = self.resolve_business_key();

        match self
            .service
            .submit_form(&self.target, &variables, business_key.as_deref())
            .await
        {
            Ok(result) => {
                self.purge_storage()?;
                self.fire_event("submit-success")?;
                Ok(result)
            }
            Err(err) => {
                self.fire_event("submit-failed")?;
                Err(err)
            }
        }
    }

    /// Report a BPMN error instead of completing, carrying the changed
    /// variables along.
    pub async fn error(&mut self, code: &str, message: Option<&str>) -> Result<(), FormError> {
        if self.fire_event("error")? {
            self.fire_event("error-failed")?;
            return Err(FormError::Prevented { action: "error" });
        }

        self.retrieve_variables()?;
        self.transform_files()?;
        let variables = self.parse_variables()?;

        match self
            .service
            .bpmn_error(&self.target, code, message, &variables)
            .await
        {
            Ok(()) => {
                self.purge_storage()?;
                self.fire_event("error-success")?;
                Ok(())
            }
            Err(err) => {
                self.fire_event("error-failed")?;
                Err(err)
            }
        }
    }

    /// Report a BPMN escalation, carrying the changed variables along.
    pub async fn escalate(&mut self, code: &str) -> Result<(), FormError> {
        if self.fire_event("escalation")? {
            self.fire_event("escalation-failed")?;
            return Err(FormError::Prevented { action: "escalation" });
        }

        self.retrieve_variables()?;
        self.transform_files()?;
        let variables = self.parse_variables()?;

        match self
            .service
            .bpmn_escalation(&self.target, code, &variables)
            .await
        {
            Ok(()) => {
                self.purge_storage()?;
                self.fire_event("escalation-success")?;
                Ok(())
            }
            Err(err) => {
                self.fire_event("escalation-failed")?;
                Err(err)
            }
        }
    }

    fn purge_storage(&mut self) -> Result<(), FormError> {
        if let Some(id) = self.target.storage_id() {
            let key = storage_key(id);
            self.storage.remove(&key)?;
        }
        Ok(())
    }

    /// Base64-encode every attached file, enforcing the per-control size
    /// cap. Runs to completion before any submission request goes out.
    fn transform_files(&mut self) -> Result<(), FormError> {
        for field in &self.fields {
            let Field::Input(input) = field else { continue };
            let control = self.document.control(input.control());
            if !control.is_file_input() {
                continue;
            }

            let limit = control
                .attr(constants::MAX_FILESIZE)
                .and_then(|raw| raw.parse::<u64>().ok())
                .unwrap_or(constants::DEFAULT_MAX_FILESIZE);

            let name = input.variable_name().to_owned();
            let mut vars = self.variables.borrow_mut();
            let Some(variable) = vars.variable_mut(&name) else {
                continue;
            };

            match control.file() {
                Some(payload) => {
                    if payload.bytes.len() as u64 > limit {
                        return Err(FormError::FileTooLarge {
                            filename: payload.filename.clone(),
                            limit,
                        });
                    }
                    variable.value = Value::String(BASE64.encode(&payload.bytes));
                    if variable.value_type == Some(VariableType::File) {
                        variable
                            .value_info
                            .insert("filename".into(), json!(payload.filename));
                        variable
                            .value_info
                            .insert("mimeType".into(), json!(payload.mime_type));
                    }
                }
                None => {
                    variable.value = json!("");
                    variable.value_info.insert("filename".into(), json!(""));
                }
            }
        }
        Ok(())
    }

    /// The submission payload: only variables that are dirty against the
    /// server, or whose rendered default changed. Json values are serialized
    /// back to strings and dates get their timezone attached.
    pub fn parse_variables(&self) -> Result<BTreeMap<String, VariableValue>, FormError> {
        let mut vars = self.variables.borrow_mut();

        // the control's bind-time text is the display default; an empty one
        // falls back to the current value
        for field in &self.fields {
            if let (Some(name), Some(original)) = (field.variable_name(), field.original_value()) {
                if let Some(variable) = vars.variable_mut(name) {
                    variable.default_value = if original.is_empty() {
                        Some(variable.value.clone())
                    } else {
                        Some(Value::String(original.to_owned()))
                    };
                }
            }
        }

        let offset = Local::now().offset().fix();
        let mut payload = BTreeMap::new();

        for variable in vars.variables() {
            let dirty = match &variable.original_value {
                Some(original) => *original != variable.value,
                None => true,
            };
            let default_changed = variable
                .default_value
                .as_ref()
                .map_or(false, |d| !typeutil::loosely_equal(d, &variable.value));
            if !dirty && !default_changed {
                continue;
            }

            let mut value = variable.value.clone();
            if variable.value_type == Some(VariableType::Json) && !value.is_string() {
                value = Value::String(
                    serde_json::to_string(&value).map_err(bpm_sdk_client::EngineError::from)?,
                );
            }
            if variable.value_type == Some(VariableType::Date) {
                if let Value::String(raw) = &value {
                    value = Value::String(typeutil::date_with_timezone(raw, offset)?);
                }
            }

            payload.insert(variable.name.clone(), variable.to_wire(value));
        }

        Ok(payload)
    }

    /// Explicit key, a scripted one, or the value of the marked control.
    fn resolve_business_key(&self) -> Option<String> {
        if let Some(key) = self.business_key.borrow().clone() {
            return Some(key);
        }
        self.document
            .find_by_attr(constants::BUSINESS_KEY)
            .map(|index| self.document.control(index).value().to_owned())
            .filter(|value| !value.is_empty())
    }

    // ─── Control/variable round trip ──────────────────────────

    /// Push every variable value into its control.
    pub fn apply_variables(&mut self) -> Result<(), FormError> {
        let mut vars = self.variables.borrow_mut();
        for field in &mut self.fields {
            field.apply_value(&mut self.document, &mut vars)?;
        }
        Ok(())
    }

    /// Pull every control value into its variable, coercing types.
    pub fn retrieve_variables(&mut self) -> Result<(), FormError> {
        let mut vars = self.variables.borrow_mut();
        for field in &mut self.fields {
            field.get_value(&self.document, &mut vars)?;
        }
        Ok(())
    }

    // ─── Events ───────────────────────────────────────────────

    /// Dispatch to Rust handlers, then scripted hooks. Returns whether a
    /// hook vetoed the operation.
    pub fn fire_event(&mut self, event: &str) -> Result<bool, FormError> {
        debug!(event, "form event");
        self.emitter.trigger(event, &json!({ "event": event }));
        self.scripts.fire(event)
    }

    pub fn on<F>(&mut self, event: &str, handler: F) -> u64
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.emitter.on(event, handler)
    }

    pub fn once<F>(&mut self, event: &str, handler: F) -> u64
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.emitter.once(event, handler)
    }

    pub fn off(&mut self, event: &str) {
        self.emitter.off(event);
    }

    // ─── Accessors ────────────────────────────────────────────

    pub fn target(&self) -> &FormTarget {
        &self.target
    }

    pub fn variables(&self) -> Rc<RefCell<VariableManager>> {
        Rc::clone(&self.variables)
    }

    pub fn document(&self) -> &FormDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut FormDocument {
        &mut self.document
    }

    pub fn set_business_key(&mut self, key: Option<&str>) {
        *self.business_key.borrow_mut() = key.map(str::to_owned);
    }

    /// Attach a file payload to the file control bound to `variable`.
    pub fn attach_file(&mut self, variable: &str, payload: FilePayload) -> Result<(), FormError> {
        let index = self
            .fields
            .iter()
            .find_map(|f| match f {
                Field::Input(input)
                    if input.variable_name() == variable
                        && self.document.control(input.control()).is_file_input() =>
                {
                    Some(input.control())
                }
                _ => None,
            })
            .ok_or_else(|| FormError::UnknownVariable(variable.to_owned()))?;
        self.document.control_mut(index).set_file(payload);
        Ok(())
    }

    /// Error codes declared by the form's error buttons.
    pub fn error_codes(&self) -> Vec<(&str, Option<&str>)> {
        self.fields
            .iter()
            .filter_map(|f| match f {
                Field::ErrorButton(b) => Some((b.code(), b.message())),
                _ => None,
            })
            .collect()
    }

    /// Escalation codes declared by the form's escalation buttons.
    pub fn escalation_codes(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|f| match f {
                Field::EscalationButton(b) => Some(b.code()),
                _ => None,
            })
            .collect()
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
