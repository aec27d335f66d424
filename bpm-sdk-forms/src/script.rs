//! Sandboxed execution of the form's embedded scripts.
//!
//! Scripts run in a restricted Lua environment: no I/O, no OS access, a
//! memory cap. They see one global, `form`, bound to the live variable
//! manager, and may register lifecycle hooks that can veto store/submit.

use crate::error::FormError;
use crate::typeutil::VariableType;
use crate::variables::{Variable, VariableManager};
use mlua::{Function, Lua, LuaOptions, LuaSerdeExt, StdLib, Table};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

const MEMORY_LIMIT: usize = 16 * 1024 * 1024;
const HOOKS_KEY: &str = "bpm-form-hooks";

pub struct ScriptEngine {
    lua: Lua,
}

impl ScriptEngine {
    pub fn new(
        vars: Rc<RefCell<VariableManager>>,
        business_key: Rc<RefCell<Option<String>>>,
    ) -> Result<Self, FormError> {
        let libs = StdLib::TABLE | StdLib::STRING | StdLib::UTF8 | StdLib::MATH;
        let lua = Lua::new_with(libs, LuaOptions::default())?;
        lua.set_memory_limit(MEMORY_LIMIT)?;

        let hooks = lua.create_table()?;
        lua.set_named_registry_value(HOOKS_KEY, hooks)?;

        let form = lua.create_table()?;

        {
            let vars = Rc::clone(&vars);
            form.set(
                "variable",
                lua.create_function(move |lua, name: String| {
                    lua.to_value(&vars.borrow().variable_value(&name))
                })?,
            )?;
        }

        {
            let vars = Rc::clone(&vars);
            form.set(
                "set_variable",
                lua.create_function(move |lua, (name, value): (String, mlua::Value)| {
                    let json: Value = lua.from_value(value)?;
                    vars.borrow_mut()
                        .set_variable_value(&name, json)
                        .map_err(|e| mlua::Error::RuntimeError(e.to_string()))
                })?,
            )?;
        }

        {
            let vars = Rc::clone(&vars);
            form.set(
                "declare",
                lua.create_function(move |_, (name, ty): (String, Option<String>)| {
                    let value_type = ty
                        .map(|t| t.parse::<VariableType>())
                        .transpose()
                        .map_err(|e| mlua::Error::RuntimeError(e.to_string()))?;
                    let mut vars = vars.borrow_mut();
                    if vars.variable(&name).is_none() {
                        vars.create_variable(Variable::new(&name, value_type, Value::Null))
                            .map_err(|e| mlua::Error::RuntimeError(e.to_string()))?;
                    }
                    Ok(())
                })?,
            )?;
        }

        {
            let business_key = Rc::clone(&business_key);
            form.set(
                "business_key",
                lua.create_function(move |_, value: Option<String>| {
                    *business_key.borrow_mut() = value;
                    Ok(())
                })?,
            )?;
        }

        form.set(
            "on",
            lua.create_function(|lua, (event, callback): (String, Function)| {
                let hooks: Table = lua.named_registry_value(HOOKS_KEY)?;
                let list: Table = match hooks.get(event.as_str()) {
                    Ok(list) => list,
                    Err(_) => {
                        let list = lua.create_table()?;
                        hooks.set(event.as_str(), list.clone())?;
                        list
                    }
                };
                list.push(callback)?;
                Ok(())
            })?,
        )?;

        lua.globals().set("form", form)?;

        Ok(Self { lua })
    }

    /// Run one embedded script block.
    pub fn execute(&self, script: &str) -> Result<(), FormError> {
        self.lua.load(script).exec()?;
        Ok(())
    }

    /// Fire a lifecycle event at the registered hooks. Returns whether any
    /// hook vetoed the operation through `ctx:prevent()`.
    pub fn fire(&self, event: &str) -> Result<bool, FormError> {
        let hooks: Table = self.lua.named_registry_value(HOOKS_KEY)?;
        let Ok(list) = hooks.get::<Table>(event) else {
            return Ok(false);
        };

        let mut prevented = false;
        for callback in list.sequence_values::<Function>() {
            let callback = callback?;
            let ctx = self.lua.create_table()?;
            ctx.set("event", event)?;
            ctx.set("prevented", false)?;
            ctx.set(
                "prevent",
                self.lua.create_function(|_, ctx: Table| {
                    ctx.set("prevented", true)
                })?,
            )?;
            callback.call::<()>(ctx.clone())?;
            if ctx.get::<bool>("prevented")? {
                prevented = true;
            }
        }
        Ok(prevented)
    }
}
