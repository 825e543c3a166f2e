//! Decorative dice shown in place of hidden or idle real dice

use super::capability::Prop;

/// Ordered decorative props; the first `n` are shown, the rest hidden
#[derive(Debug, Clone)]
pub struct DecorativeSet<P: Prop> {
    props: Vec<P>,
}

impl<P: Prop> DecorativeSet<P> {
    pub fn new(props: Vec<P>) -> Self {
        Self { props }
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Show the first `visible_amount` props and hide the rest
    pub fn set_visible_amount(&mut self, visible_amount: usize) {
        for (i, prop) in self.props.iter_mut().enumerate() {
            prop.set_active(i < visible_amount);
        }
    }

    pub fn visible_count(&self) -> usize {
        self.props.iter().filter(|p| p.is_active()).count()
    }

    pub fn props(&self) -> &[P] {
        &self.props
    }
}
