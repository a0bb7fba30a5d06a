#[test]
fn tmp_dbg() {
    use crate::builtins::Builtins;
    use crate::codegen::Generator;
    use crate::parse::{Lexer, parse_program};
    let mut builtins = Builtins::new();
    let mut generator = Generator::new(&mut builtins, None);
    let mut bytes = b"$$ := 1 + 2\n".as_slice();
    let mut lexer = Lexer::new(&mut bytes);
    let r = parse_program(&mut lexer, &mut generator);
    eprintln!("{:?}", r);
}
