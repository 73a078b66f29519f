use crate::error::Result;
use crate::writer::RustWriter;
use std::fmt;
use std::rc::Rc;

/// A deferred piece of code: a function that writes into a [`RustWriter`].
///
/// Writables are cheap to clone and can be passed as template arguments, where they
/// are rendered into a child writer whose dependencies are merged into the parent.
#[derive(Clone)]
pub struct Writable(Rc<dyn Fn(&mut RustWriter) -> Result<()>>);

impl Writable {
    pub fn new(f: impl Fn(&mut RustWriter) -> Result<()> + 'static) -> Self {
        Writable(Rc::new(f))
    }

    /// A writable that writes nothing.
    pub fn empty() -> Self {
        Writable::new(|_| Ok(()))
    }

    /// A writable that emits `text` verbatim.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Writable::new(move |w| {
            w.rust(&text);
            Ok(())
        })
    }

    pub fn write_to(&self, writer: &mut RustWriter) -> Result<()> {
        (self.0)(writer)
    }

    /// Run every writable in order.
    pub fn join(writables: impl IntoIterator<Item = Writable>) -> Self {
        let writables: Vec<_> = writables.into_iter().collect();
        Writable::new(move |w| {
            for writable in &writables {
                writable.write_to(w)?;
            }
            Ok(())
        })
    }
}

impl fmt::Debug for Writable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Writable(..)")
    }
}

/// Shorthand for [`Writable::new`].
pub fn writable(f: impl Fn(&mut RustWriter) -> Result<()> + 'static) -> Writable {
    Writable::new(f)
}
