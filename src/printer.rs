use crate::ast::{
    ArrayAccess, ArrayLiteral, Assignment, BinaryOp, Expression, ExpressionStatement,
    ExpressionVisitor, For, FunctionCall, FunctionDefinition, If, Literal, Print, Program, Return,
    Statement, StatementVisitor, TryCatch, UnaryOp, Variable, While,
};

const INDENT: &str = "    ";

/// Renders a tree back to source text that parses to the same tree.
///
/// Nested binary operations are parenthesized, since the tree no longer
/// records the grouping the author wrote.
pub struct AstPrinter {
    depth: usize,
}

impl AstPrinter {
    pub fn new() -> AstPrinter {
        AstPrinter { depth: 0 }
    }

    pub fn print(program: &Program) -> String {
        program.accept(&mut AstPrinter::new())
    }

    pub fn statement(&mut self, stmt: &Statement) -> String {
        stmt.accept(self)
    }

    pub fn expression(&mut self, expr: &Expression) -> String {
        expr.accept(self)
    }

    fn block(&mut self, statements: &[Statement]) -> String {
        if statements.is_empty() {
            return String::from("{}");
        }
        self.depth += 1;
        let mut x = String::from("{\n");
        for stmt in statements {
            x.push_str(&INDENT.repeat(self.depth));
            x.push_str(&stmt.accept(self));
            x.push('\n');
        }
        self.depth -= 1;
        x.push_str(&INDENT.repeat(self.depth));
        x.push('}');
        x
    }

    fn operand(&mut self, expr: &Expression) -> String {
        match expr {
            Expression::Binary(_) => format!("({})", expr.accept(self)),
            _ => expr.accept(self),
        }
    }

    fn list(&mut self, items: &[Expression]) -> String {
        items
            .iter()
            .map(|item| item.accept(self))
            .collect::<Vec<String>>()
            .join(", ")
    }

    fn assignment(&mut self, assignment: &Assignment) -> String {
        format!(
            "{}{} = {}",
            if assignment.declaration { "let " } else { "" },
            assignment.name,
            assignment.value.accept(self)
        )
    }
}

impl Default for AstPrinter {
    fn default() -> Self {
        AstPrinter::new()
    }
}

impl StatementVisitor for AstPrinter {
    type Output = String;

    fn visit_program(&mut self, program: &Program) -> String {
        let mut x = String::new();
        for stmt in &program.statements {
            x.push_str(&stmt.accept(self));
            x.push('\n');
        }
        x
    }

    fn visit_assignment(&mut self, assignment: &Assignment) -> String {
        format!("{};", self.assignment(assignment))
    }

    fn visit_if(&mut self, node: &If) -> String {
        let mut x = format!(
            "if ({}) {}",
            node.condition.accept(self),
            self.block(&node.then_branch)
        );
        if !node.else_branch.is_empty() {
            x.push_str(" else ");
            x.push_str(&self.block(&node.else_branch));
        }
        x
    }

    fn visit_while(&mut self, node: &While) -> String {
        format!(
            "while ({}) {}",
            node.condition.accept(self),
            self.block(&node.body)
        )
    }

    fn visit_for(&mut self, node: &For) -> String {
        format!(
            "for ({}; {}; {}) {}",
            self.assignment(&node.initializer),
            node.condition.accept(self),
            self.assignment(&node.increment),
            self.block(&node.body)
        )
    }

    fn visit_function_definition(&mut self, definition: &FunctionDefinition) -> String {
        format!(
            "function {}({}) {}",
            definition.name,
            definition.params.join(", "),
            self.block(&definition.body)
        )
    }

    fn visit_return(&mut self, node: &Return) -> String {
        match &node.value {
            Some(value) => format!("return {};", value.accept(self)),
            None => String::from("return;"),
        }
    }

    fn visit_print(&mut self, node: &Print) -> String {
        format!("print({});", node.value.accept(self))
    }

    fn visit_try_catch(&mut self, node: &TryCatch) -> String {
        format!(
            "try {} catch {}",
            self.block(&node.try_block),
            self.block(&node.catch_block)
        )
    }

    fn visit_expression_statement(&mut self, node: &ExpressionStatement) -> String {
        format!("{};", node.expression.accept(self))
    }
}

impl ExpressionVisitor for AstPrinter {
    type Output = String;

    fn visit_binary_op(&mut self, node: &BinaryOp) -> String {
        format!(
            "{} {} {}",
            self.operand(&node.left),
            node.operator,
            self.operand(&node.right)
        )
    }

    fn visit_unary_op(&mut self, node: &UnaryOp) -> String {
        format!("{}{}", node.operator, self.operand(&node.operand))
    }

    fn visit_literal(&mut self, literal: &Literal) -> String {
        match literal {
            Literal::Number(x) => format!("{}", x),
            Literal::Text(x) => format!("\"{}\"", x),
        }
    }

    fn visit_variable(&mut self, variable: &Variable) -> String {
        variable.name.clone()
    }

    fn visit_function_call(&mut self, call: &FunctionCall) -> String {
        format!("{}({})", call.name, self.list(&call.arguments))
    }

    fn visit_array_access(&mut self, access: &ArrayAccess) -> String {
        format!("{}[{}]", access.name, access.index.accept(self))
    }

    fn visit_array_literal(&mut self, array: &ArrayLiteral) -> String {
        format!("[{}]", self.list(&array.elements))
    }
}

#[cfg(test)]
mod printer_tests {
    use super::AstPrinter;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn basic_printer_test() {
        let program = parse("let x = -(1 + 2) * 3;").unwrap();
        assert_eq!(AstPrinter::print(&program), "let x = -(1 + 2) * 3;\n");
    }

    #[test]
    fn blocks_are_indented() {
        let source = "function f(a, b) { if (a < b) { return a; } else { return b; } } print(f(1, 2));";
        let expected = "\
function f(a, b) {
    if (a < b) {
        return a;
    } else {
        return b;
    }
}
print(f(1, 2));
";
        assert_eq!(AstPrinter::print(&parse(source).unwrap()), expected);
    }

    #[test]
    fn loops_and_try() {
        let source = "for (let i = 0; i < 3; i = i + 1) { print(xs[i]); } try {} catch { print(\"e\"); }";
        let expected = "\
for (let i = 0; i < 3; i = i + 1) {
    print(xs[i]);
}
try {} catch {
    print(\"e\");
}
";
        assert_eq!(AstPrinter::print(&parse(source).unwrap()), expected);
    }

    #[test]
    fn output_parses_back_to_the_same_tree() {
        let source = "
            let xs = [1, 2.5, \"three\"];
            function f(n) { while (!(n <= 0) && n != 7 || n % 2 == 1) { n = n - 1; } return; }
            f(10 - 3 - 2);
        ";
        let program = parse(source).unwrap();
        let printed = AstPrinter::print(&program);
        let reparsed = parse(&printed).unwrap();
        // Positions differ; compare through a second rendering.
        assert_eq!(AstPrinter::print(&reparsed), printed);
        assert_eq!(reparsed.statements.len(), program.statements.len());
    }
}
