//! Reference object graph for the smoke walkthrough.

use delegator_core::{Attr, InvokeError, Member, SymbolDescriptor, Value};
use std::sync::Arc;

pub struct RabbitHole {
    down_we_go: String,
}

impl RabbitHole {
    fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            down_we_go: text.to_string(),
        })
    }
}

impl Member for RabbitHole {
    fn symbols(&self) -> Vec<SymbolDescriptor> {
        vec![SymbolDescriptor::property("down_we_go")]
    }

    fn get_attr(&self, name: &str) -> Option<Attr> {
        match name {
            "down_we_go" => Some(Attr::Value(Value::from(self.down_we_go.as_str()))),
            _ => None,
        }
    }
}

pub struct Foo {
    rabbit: Arc<RabbitHole>,
}

impl Member for Foo {
    fn symbols(&self) -> Vec<SymbolDescriptor> {
        vec![
            SymbolDescriptor::method("foo"),
            SymbolDescriptor::property("foo_property"),
            SymbolDescriptor::property("not_delegated_property"),
            SymbolDescriptor::object("rabbit"),
        ]
    }

    fn get_attr(&self, name: &str) -> Option<Attr> {
        match name {
            "foo" => Some(Attr::Method),
            "foo_property" => Some(Attr::Value(Value::from("hi"))),
            "not_delegated_property" => Some(Attr::Value(Value::from("bye"))),
            "rabbit" => Some(Attr::Object(self.rabbit.clone())),
            _ => None,
        }
    }

    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, InvokeError> {
        match (name, args) {
            ("foo", [text]) => Ok(text.clone()),
            ("foo", _) => Err(InvokeError::invalid_arguments(name, "expected one argument")),
            _ => Err(InvokeError::UnknownMethod(name.to_string())),
        }
    }
}

pub struct Bar {
    rabbit_too: Arc<RabbitHole>,
}

impl Member for Bar {
    fn symbols(&self) -> Vec<SymbolDescriptor> {
        vec![
            SymbolDescriptor::object("rabbit_too"),
            SymbolDescriptor::property("boring"),
            SymbolDescriptor::method("bar_meth"),
        ]
    }

    fn get_attr(&self, name: &str) -> Option<Attr> {
        match name {
            "rabbit_too" => Some(Attr::Object(self.rabbit_too.clone())),
            "boring" => Some(Attr::Value(Value::Int(2))),
            "bar_meth" => Some(Attr::Method),
            _ => None,
        }
    }

    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, InvokeError> {
        match (name, args) {
            ("bar_meth", [Value::Str(text)]) => Ok(Value::Str(format!("{text}{text}"))),
            ("bar_meth", _) => Err(InvokeError::invalid_arguments(
                name,
                "expected one string argument",
            )),
            _ => Err(InvokeError::UnknownMethod(name.to_string())),
        }
    }
}

/// Host of the walkthrough: two member objects and one plain property.
pub struct Master {
    foo_obj: Arc<Foo>,
    bar_obj: Arc<Bar>,
}

impl Master {
    pub fn new() -> Self {
        Self {
            foo_obj: Arc::new(Foo {
                rabbit: RabbitHole::new("first rabbit"),
            }),
            bar_obj: Arc::new(Bar {
                rabbit_too: RabbitHole::new("second rabbit"),
            }),
        }
    }
}

impl Member for Master {
    fn symbols(&self) -> Vec<SymbolDescriptor> {
        vec![
            SymbolDescriptor::object("foo_obj"),
            SymbolDescriptor::object("bar_obj"),
            SymbolDescriptor::property("test"),
            SymbolDescriptor::method("master_method"),
        ]
    }

    fn get_attr(&self, name: &str) -> Option<Attr> {
        match name {
            "foo_obj" => Some(Attr::Object(self.foo_obj.clone())),
            "bar_obj" => Some(Attr::Object(self.bar_obj.clone())),
            "test" => Some(Attr::Value(Value::Int(1))),
            "master_method" => Some(Attr::Method),
            _ => None,
        }
    }

    fn invoke(&self, name: &str, _args: &[Value]) -> Result<Value, InvokeError> {
        match name {
            "master_method" => Ok(Value::from("I'm the master")),
            _ => Err(InvokeError::UnknownMethod(name.to_string())),
        }
    }
}
