/// A term produced by an analyzer chain
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,      // Term text after filtering
    pub position: u32,     // Word position in the value
    pub offset: usize,     // Byte offset in the input value
    pub length: usize,     // Byte length in the input value
}

impl Token {
    pub fn new(text: String, position: u32, offset: usize) -> Self {
        let length = text.len();
        Token {
            text,
            position,
            offset,
            length,
        }
    }
}
