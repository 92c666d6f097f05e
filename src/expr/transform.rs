//! Tree-wide rewriting and search over [`Expr`].

use super::{ConvertExpression, Expr, Parameter};

impl Expr {
    /// Rewrites the tree top-down.
    ///
    /// `f` sees every node before its children. Returning `Some` replaces the
    /// node and the replacement is not visited again; returning `None` keeps
    /// the node and rewrites its children.
    #[must_use]
    pub fn transform<F>(&self, f: &mut F) -> Self
    where
        F: FnMut(&Self) -> Option<Self>,
    {
        if let Some(replacement) = f(self) {
            return replacement;
        }

        match self {
            Self::Parameter(_) | Self::Constant { .. } | Self::DefaultValue(_) => self.clone(),
            Self::Call { function, args } => Self::Call {
                function: function.clone(),
                args: args.iter().map(|a| a.transform(f)).collect(),
            },
            Self::Condition {
                test,
                if_true,
                if_false,
            } => Self::Condition {
                test: Box::new(test.transform(f)),
                if_true: Box::new(if_true.transform(f)),
                if_false: Box::new(if_false.transform(f)),
            },
            Self::Convert { operand, ty } => Self::Convert {
                operand: Box::new(operand.transform(f)),
                ty: ty.clone(),
            },
            Self::HasValue(operand) => Self::HasValue(Box::new(operand.transform(f))),
            Self::NotNull(operand) => Self::NotNull(Box::new(operand.transform(f))),
        }
    }

    /// First node, in pre-order, matching `predicate`.
    pub fn find(&self, predicate: &dyn Fn(&Self) -> bool) -> Option<&Self> {
        if predicate(self) {
            return Some(self);
        }

        match self {
            Self::Parameter(_) | Self::Constant { .. } | Self::DefaultValue(_) => None,
            Self::Call { args, .. } => args.iter().find_map(|a| a.find(predicate)),
            Self::Condition {
                test,
                if_true,
                if_false,
            } => test
                .find(predicate)
                .or_else(|| if_true.find(predicate))
                .or_else(|| if_false.find(predicate)),
            Self::Convert { operand, .. } | Self::HasValue(operand) | Self::NotNull(operand) => {
                operand.find(predicate)
            }
        }
    }

    /// Replaces every reference to `parameter` with `with`.
    #[must_use]
    pub fn replace_parameter(&self, parameter: &Parameter, with: &Self) -> Self {
        self.transform(&mut |e| match e {
            Self::Parameter(p) if p.id == parameter.id => Some(with.clone()),
            _ => None,
        })
    }
}

impl ConvertExpression {
    /// Rewrites the body, keeping the parameter.
    #[must_use]
    pub fn transform_body<F>(&self, f: &mut F) -> Self
    where
        F: FnMut(&Expr) -> Option<Expr>,
    {
        Self {
            parameter: self.parameter.clone(),
            body: self.body.transform(f),
        }
    }
}
