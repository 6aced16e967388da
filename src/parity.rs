/// Symbol-set comparison between the template and the provisioned variant.
///
/// Both variants must declare the same names, otherwise firmware built
/// against one breaks against the other. Order and duplicates are ignored.
#[derive(Debug, Clone, Copy)]
pub struct SymbolDiff<'a> {
    example: &'a [&'a str],
    real: &'a [&'a str],
}

impl<'a> SymbolDiff<'a> {
    pub fn new(example: &'a [&'a str], real: &'a [&'a str]) -> Self {
        Self { example, real }
    }

    /// Names the template declares but the provisioned variant lacks.
    pub fn missing_from_real(&self) -> impl Iterator<Item = &'a str> + 'a {
        difference(self.example, self.real)
    }

    /// Names the provisioned variant declares but the template lacks.
    pub fn extra_in_real(&self) -> impl Iterator<Item = &'a str> + 'a {
        difference(self.real, self.example)
    }

    pub fn is_symmetric(&self) -> bool {
        self.missing_from_real().next().is_none() && self.extra_in_real().next().is_none()
    }
}

// Each name in `left` absent from `right`, reported once.
fn difference<'a>(left: &'a [&'a str], right: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
    left.iter()
        .enumerate()
        .filter(move |&(i, name)| !left[..i].contains(name) && !right.contains(name))
        .map(|(_, name)| *name)
}
