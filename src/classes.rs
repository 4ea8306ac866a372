// ABOUTME: Class descriptors and live instances backing the dialect's Class...End Class objects

use crate::ast::{ClassDecl, ProcDecl, ProcKind};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// The compiled shape of a `Class` block: field names, constants, and its methods split
/// by kind so property dispatch doesn't have to re-inspect `ProcKind` on every access.
#[derive(Debug)]
pub struct ClassDescriptor {
    pub name: String,
    pub fields: Vec<String>,
    pub consts: HashMap<String, Value>,
    pub methods: HashMap<String, Rc<ProcDecl>>,
    pub property_get: HashMap<String, Rc<ProcDecl>>,
    pub property_let: HashMap<String, Rc<ProcDecl>>,
    pub property_set: HashMap<String, Rc<ProcDecl>>,
}

impl ClassDescriptor {
    pub fn from_decl(decl: &ClassDecl, const_values: HashMap<String, Value>) -> Self {
        let mut methods = HashMap::new();
        let mut property_get = HashMap::new();
        let mut property_let = HashMap::new();
        let mut property_set = HashMap::new();
        for member in &decl.members {
            let key = member.name.to_ascii_lowercase();
            let rc = Rc::new(member.clone());
            match member.kind {
                ProcKind::Sub | ProcKind::Function => {
                    methods.insert(key, rc);
                }
                ProcKind::PropertyGet => {
                    property_get.insert(key, rc);
                }
                ProcKind::PropertyLet => {
                    property_let.insert(key, rc);
                }
                ProcKind::PropertySet => {
                    property_set.insert(key, rc);
                }
            }
        }
        ClassDescriptor {
            name: decl.name.clone(),
            fields: decl.fields.iter().map(|f| f.name.clone()).collect(),
            consts: const_values,
            methods,
            property_get,
            property_let,
            property_set,
        }
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<ProcDecl>> {
        self.methods.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn find_property_get(&self, name: &str) -> Option<Rc<ProcDecl>> {
        self.property_get.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn find_property_let(&self, name: &str) -> Option<Rc<ProcDecl>> {
        self.property_let.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn find_property_set(&self, name: &str) -> Option<Rc<ProcDecl>> {
        self.property_set.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn has_field(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        self.fields.iter().any(|f| f.eq_ignore_ascii_case(&lower))
    }

    pub fn find_initialize(&self) -> Option<Rc<ProcDecl>> {
        self.find_method("class_initialize")
    }

    pub fn find_terminate(&self) -> Option<Rc<ProcDecl>> {
        self.find_method("class_terminate")
    }
}

/// A live instance: a class descriptor plus its own field storage. `Class_Terminate`
/// is not implemented via `Drop` — the evaluator calls it explicitly at the point a
/// `Set`-reassignment or scope exit would drop the instance's last strong reference,
/// since invoking script code from a `Drop` impl has no way to reach the interpreter.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<ClassDescriptor>,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<ClassDescriptor>) -> Self {
        let fields = class.fields.iter().map(|f| (f.to_ascii_lowercase(), Value::Empty)).collect();
        Instance { class, fields: RefCell::new(fields) }
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_ascii_lowercase(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FieldDecl, Visibility};
    use crate::error::Position;

    fn sample_decl() -> ClassDecl {
        ClassDecl {
            name: "Counter".to_string(),
            fields: vec![FieldDecl { name: "Total".to_string(), visibility: Visibility::Public }],
            consts: vec![],
            members: vec![ProcDecl {
                name: "Increment".to_string(),
                kind: ProcKind::Sub,
                visibility: Visibility::Public,
                params: vec![],
                body: vec![],
                pos: Position::start(),
            }],
            pos: Position::start(),
        }
    }

    #[test]
    fn methods_are_looked_up_case_insensitively() {
        let desc = ClassDescriptor::from_decl(&sample_decl(), HashMap::new());
        assert!(desc.find_method("INCREMENT").is_some());
    }

    #[test]
    fn new_instance_initializes_fields_to_empty() {
        let desc = Rc::new(ClassDescriptor::from_decl(&sample_decl(), HashMap::new()));
        let inst = Instance::new(desc);
        assert!(matches!(inst.get_field("total"), Some(Value::Empty)));
    }

    #[test]
    fn has_field_matches_regardless_of_case() {
        let desc = ClassDescriptor::from_decl(&sample_decl(), HashMap::new());
        assert!(desc.has_field("total"));
        assert!(desc.has_field("TOTAL"));
        assert!(!desc.has_field("missing"));
    }
}
