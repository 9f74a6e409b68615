//! Type Descriptors
//!
//! IR 类型到 JVM 描述符的映射。类名按导入的最后一段解析为全限定路径，
//! 未导入的名字原样使用（当前类或默认包中的类）。

use jmm_ollir::{ClassUnit, ElementType};

pub struct Descriptors<'a> {
    class_name: &'a str,
    imports: &'a [String],
}

impl<'a> Descriptors<'a> {
    pub fn new(unit: &'a ClassUnit) -> Self {
        Self {
            class_name: &unit.name,
            imports: &unit.imports,
        }
    }

    /// 类的内部名：`java.util.List` -> `java/util/List`
    pub fn class_path(&self, name: &str) -> String {
        if name == self.class_name {
            return name.to_string();
        }
        let imported = self
            .imports
            .iter()
            .find(|path| path.rsplit('.').next() == Some(name));
        match (imported, name) {
            (Some(path), _) => path.replace('.', "/"),
            (None, "Object") => "java/lang/Object".to_string(),
            (None, "String") => "java/lang/String".to_string(),
            (None, _) => name.to_string(),
        }
    }

    pub fn super_path(&self, super_class: Option<&str>) -> String {
        self.class_path(super_class.unwrap_or("Object"))
    }

    pub fn type_descriptor(&self, ty: &ElementType) -> String {
        match ty {
            ElementType::Int32 => "I".to_string(),
            ElementType::Boolean => "Z".to_string(),
            ElementType::Void => "V".to_string(),
            ElementType::String => "Ljava/lang/String;".to_string(),
            ElementType::Array(element) => format!("[{}", self.type_descriptor(element)),
            ElementType::ClassRef(name) => format!("L{};", self.class_path(name)),
        }
    }

    /// `(I[Z)V`
    pub fn method_descriptor<'t>(
        &self,
        params: impl IntoIterator<Item = &'t ElementType>,
        return_type: &ElementType,
    ) -> String {
        let params: String = params
            .into_iter()
            .map(|ty| self.type_descriptor(ty))
            .collect();
        format!("({}){}", params, self.type_descriptor(return_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> ClassUnit {
        ClassUnit {
            imports: vec!["io".into(), "java.util.List".into()],
            name: "A".into(),
            super_class: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    #[test]
    fn test_class_paths() {
        let unit = unit();
        let d = Descriptors::new(&unit);
        assert_eq!(d.class_path("List"), "java/util/List");
        assert_eq!(d.class_path("io"), "io");
        assert_eq!(d.class_path("A"), "A");
        assert_eq!(d.class_path("Object"), "java/lang/Object");
        assert_eq!(d.super_path(None), "java/lang/Object");
        assert_eq!(d.super_path(Some("List")), "java/util/List");
    }

    #[test]
    fn test_descriptors() {
        let unit = unit();
        let d = Descriptors::new(&unit);
        let strings = ElementType::array_of(ElementType::String);
        assert_eq!(d.type_descriptor(&strings), "[Ljava/lang/String;");
        assert_eq!(
            d.type_descriptor(&ElementType::ClassRef("List".into())),
            "Ljava/util/List;"
        );
        let params = [ElementType::Int32, ElementType::array_of(ElementType::Boolean)];
        assert_eq!(
            d.method_descriptor(&params, &ElementType::Void),
            "(I[Z)V"
        );
    }
}
