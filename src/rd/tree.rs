use ptree::TreeItem;

/// A derivation tree produced by [super::Oracle::derive]: a leaf is a
/// consumed terminal occurrence, an internal node a chosen production
/// alternative.
#[derive(Debug, Clone)]
pub enum ParseTree {
    Leaf {
        terminal: String,
        position: usize,
    },
    Internal {
        production: String,
        alt_index: usize,
        children: Vec<ParseTree>,
    },
}

impl ParseTree {
    pub fn label(&self) -> String {
        match self {
            ParseTree::Leaf { terminal, position } => format!("{} @ {}", terminal, position),
            ParseTree::Internal {
                production,
                alt_index,
                ..
            } => format!("{} (alt {})", production, alt_index),
        }
    }
}

impl TreeItem for ParseTree {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label())
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        match self {
            ParseTree::Leaf { .. } => std::borrow::Cow::from(&[][..]),
            ParseTree::Internal { children, .. } => std::borrow::Cow::from(children),
        }
    }
}

impl ParseTree {
    pub fn print(&self) -> std::io::Result<()> {
        ptree::print_tree(self)
    }
}
