use colour::yellow_ln_bold;

#[derive(Clone, Debug)]
pub struct CompilerWarning {
    pub msg: String,
    pub warning_kind: WarningKind,
}

impl CompilerWarning {
    pub fn new(msg: impl Into<String>, warning_kind: WarningKind) -> CompilerWarning {
        CompilerWarning {
            msg: msg.into(),
            warning_kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WarningKind {
    /// Same name declared twice in one scope
    Redeclaration,

    /// Type resolver saw a tag it doesn't know and fell back to int64
    UnknownTypeTag,
}

pub fn print_formatted_warning(w: &CompilerWarning) {
    yellow_ln_bold!("WARNING: ");
    match w.warning_kind {
        WarningKind::Redeclaration => {
            println!("Redeclaration of '{}' in the same scope", w.msg);
        }
        WarningKind::UnknownTypeTag => {
            println!("Unknown type tag '{}', defaulting to !int64", w.msg);
        }
    }
}
