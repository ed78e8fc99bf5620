//! Append-only word image shared by the code and data segments. Grounded
//! in `codeimg.c`: both segments grow independently during pass 1, then
//! concatenate once the final code length is known.
//!
//! Values are stored as the caller's raw integer, not pre-masked to 10
//! bits: a `.data` value can be handed in out of range on purpose (the
//! output stage masks it, with a warning), while packed instruction words
//! from [`crate::isa`] already arrive in range. Masking only ever happens
//! once, at output time.

/// One stored value, tagged with the source line that produced it (used
/// for diagnostics that point back at pass 2 re-emission).
#[derive(Clone, Copy, Debug)]
pub struct TaggedWord {
    pub value: i64,
    pub line: u32,
}

#[derive(Debug, Default)]
pub struct Image {
    words: Vec<TaggedWord>,
}

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_word(&mut self, value: i64, line: u32) {
        self.words.push(TaggedWord { value, line });
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaggedWord> {
        self.words.iter()
    }

    /// Overwrite a previously-reserved slot. Pass 1 reserves word count
    /// only; pass 2 re-parses and calls this to fill in the real value.
    pub fn set(&mut self, index: usize, value: i64) {
        self.words[index].value = value;
    }

    /// Append `other`'s words after this image's own, consuming it. Used
    /// to concatenate the data image onto the end of the code image.
    pub fn extend(&mut self, other: Image) {
        self.words.extend(other.words);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extend_appends_in_order() {
        let mut code = Image::new();
        code.push_word(1, 1);
        let mut data = Image::new();
        data.push_word(2, 2);
        data.push_word(3, 3);
        code.extend(data);
        let words: Vec<i64> = code.iter().map(|w| w.value).collect();
        assert_eq!(words, vec![1, 2, 3]);
    }

    #[test]
    fn set_overwrites_reserved_slot() {
        let mut img = Image::new();
        img.push_word(0, 1);
        img.set(0, 0x3FF);
        assert_eq!(img.iter().next().unwrap().value, 0x3FF);
    }
}
