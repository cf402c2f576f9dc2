//! Recursive-descent parser: tokens → [`Document`].
//!
//! Accepts type-system definitions and extensions, directive definitions,
//! and executable operations and fragments in one document.

use serde_json::{Map, Number, Value};

use crate::ir::OperationKind;

use super::ast::{
    Definition, Directive, Document, EnumValueDefinition, FieldDefinition, FieldSelection,
    FragmentDefinition, InputValueDefinition, OperationDefinition, SchemaDefinition, Selection,
    TypeAnnotation, TypeDefinition, TypeDefinitionKind,
};
use super::lexer::{SyntaxError, Token, TokenKind, tokenize};

/// Parse a complete document.
pub fn parse_document(src: &str) -> Result<Document, SyntaxError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.document()
}

type ParseResult<T> = Result<T, SyntaxError>;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().map_or(TokenKind::Eof, |t| t.kind)
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_punct(c))
    }

    fn at_name(&self, name: &str) -> bool {
        self.peek().is_some_and(|t| t.is_name(name))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.as_ref().is_some_and(|t| t.kind != TokenKind::Eof) {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        let (line, column) = self.peek().map_or((0, 0), |t| (t.line, t.column));
        SyntaxError {
            line,
            column,
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let found = self
            .peek()
            .map_or_else(|| "end of input".to_string(), ToString::to_string);
        self.error_here(format!("expected {expected}, found {found}"))
    }

    fn expect_punct(&mut self, c: char) -> ParseResult<()> {
        if self.at_punct(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{c}`")))
        }
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_name(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Name => {
                let value = t.value.clone();
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected("a name")),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.at_name(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{keyword}`")))
        }
    }

    fn description(&mut self) -> Option<String> {
        if self.peek().is_some_and(Token::is_string) {
            self.advance().map(|t| t.value)
        } else {
            None
        }
    }

    fn document(&mut self) -> ParseResult<Document> {
        let mut definitions = Vec::new();
        while self.peek_kind() != TokenKind::Eof {
            definitions.push(self.definition()?);
        }
        Ok(Document { definitions })
    }

    fn definition(&mut self) -> ParseResult<Definition> {
        if self.at_punct('{') {
            return self.operation(None).map(Definition::Operation);
        }
        let description = self.description();
        let Some(keyword) = self
            .peek()
            .filter(|t| t.kind == TokenKind::Name)
            .map(|t| t.value.clone())
        else {
            return Err(self.unexpected("a definition"));
        };

        match keyword.as_str() {
            "schema" => self.schema_definition(description).map(Definition::Schema),
            "scalar" | "type" | "interface" | "union" | "enum" | "input" => {
                self.type_definition(description).map(Definition::Type)
            }
            "extend" => {
                self.advance();
                if self.at_name("schema") {
                    self.schema_definition(None).map(Definition::Schema)
                } else {
                    self.type_definition(None).map(Definition::Extension)
                }
            }
            "directive" => self.directive_definition(),
            "query" | "mutation" | "subscription" if description.is_none() => {
                let kind = operation_kind(&keyword).unwrap_or(OperationKind::Query);
                self.operation(Some(kind)).map(Definition::Operation)
            }
            "fragment" if description.is_none() => self.fragment().map(Definition::Fragment),
            _ => Err(self.unexpected("a definition")),
        }
    }

    fn schema_definition(&mut self, description: Option<String>) -> ParseResult<SchemaDefinition> {
        self.expect_keyword("schema")?;
        self.directives(true)?;
        let mut roots = Vec::new();
        if self.eat_punct('{') {
            while !self.eat_punct('}') {
                let keyword = self.expect_name()?;
                let Some(kind) = operation_kind(&keyword) else {
                    return Err(self.error_here(format!("unknown root operation `{keyword}`")));
                };
                self.expect_punct(':')?;
                roots.push((kind, self.expect_name()?));
            }
        }
        Ok(SchemaDefinition { description, roots })
    }

    fn type_definition(&mut self, description: Option<String>) -> ParseResult<TypeDefinition> {
        let keyword = self.expect_name()?;
        let line = self.peek().map_or(0, |t| t.line);
        let name = self.expect_name()?;
        let kind = match keyword.as_str() {
            "scalar" => TypeDefinitionKind::Scalar,
            "type" | "interface" => {
                let interfaces = self.implements()?;
                let directives = self.directives(true)?;
                let fields = if self.at_punct('{') {
                    self.field_definitions()?
                } else {
                    Vec::new()
                };
                return Ok(TypeDefinition {
                    name,
                    description,
                    directives,
                    kind: if keyword == "type" {
                        TypeDefinitionKind::Object { interfaces, fields }
                    } else {
                        TypeDefinitionKind::Interface { interfaces, fields }
                    },
                    line,
                });
            }
            "input" => {
                let directives = self.directives(true)?;
                let mut fields = Vec::new();
                if self.eat_punct('{') {
                    while !self.eat_punct('}') {
                        fields.push(self.input_value()?);
                    }
                }
                return Ok(TypeDefinition {
                    name,
                    description,
                    directives,
                    kind: TypeDefinitionKind::InputObject { fields },
                    line,
                });
            }
            "enum" => {
                let directives = self.directives(true)?;
                let mut values = Vec::new();
                if self.eat_punct('{') {
                    while !self.eat_punct('}') {
                        let description = self.description();
                        let name = self.expect_name()?;
                        let directives = self.directives(true)?;
                        values.push(EnumValueDefinition {
                            name,
                            description,
                            directives,
                        });
                    }
                }
                return Ok(TypeDefinition {
                    name,
                    description,
                    directives,
                    kind: TypeDefinitionKind::Enum { values },
                    line,
                });
            }
            "union" => {
                let directives = self.directives(true)?;
                let mut members = Vec::new();
                if self.eat_punct('=') {
                    self.eat_punct('|');
                    members.push(self.expect_name()?);
                    while self.eat_punct('|') {
                        members.push(self.expect_name()?);
                    }
                }
                return Ok(TypeDefinition {
                    name,
                    description,
                    directives,
                    kind: TypeDefinitionKind::Union { members },
                    line,
                });
            }
            other => return Err(self.error_here(format!("unknown definition keyword `{other}`"))),
        };
        let directives = self.directives(true)?;
        Ok(TypeDefinition {
            name,
            description,
            directives,
            kind,
            line,
        })
    }

    fn implements(&mut self) -> ParseResult<Vec<String>> {
        let mut interfaces = Vec::new();
        if self.at_name("implements") {
            self.advance();
            self.eat_punct('&');
            interfaces.push(self.expect_name()?);
            while self.eat_punct('&') {
                interfaces.push(self.expect_name()?);
            }
        }
        Ok(interfaces)
    }

    fn field_definitions(&mut self) -> ParseResult<Vec<FieldDefinition>> {
        self.expect_punct('{')?;
        let mut fields = Vec::new();
        while !self.eat_punct('}') {
            let description = self.description();
            let name = self.expect_name()?;
            let arguments = self.argument_definitions()?;
            self.expect_punct(':')?;
            let ty = self.type_annotation()?;
            let directives = self.directives(true)?;
            fields.push(FieldDefinition {
                name,
                description,
                arguments,
                ty,
                directives,
            });
        }
        Ok(fields)
    }

    fn argument_definitions(&mut self) -> ParseResult<Vec<InputValueDefinition>> {
        let mut arguments = Vec::new();
        if self.eat_punct('(') {
            while !self.eat_punct(')') {
                arguments.push(self.input_value()?);
            }
        }
        Ok(arguments)
    }

    fn input_value(&mut self) -> ParseResult<InputValueDefinition> {
        let description = self.description();
        let name = self.expect_name()?;
        self.expect_punct(':')?;
        let ty = self.type_annotation()?;
        let default = if self.eat_punct('=') {
            Some(self.value(true)?)
        } else {
            None
        };
        let directives = self.directives(true)?;
        Ok(InputValueDefinition {
            name,
            description,
            ty,
            default,
            directives,
        })
    }

    fn type_annotation(&mut self) -> ParseResult<TypeAnnotation> {
        let base = if self.eat_punct('[') {
            let inner = self.type_annotation()?;
            self.expect_punct(']')?;
            TypeAnnotation::List(Box::new(inner))
        } else {
            TypeAnnotation::Named(self.expect_name()?)
        };
        if self.eat_punct('!') {
            Ok(TypeAnnotation::NonNull(Box::new(base)))
        } else {
            Ok(base)
        }
    }

    fn directives(&mut self, constant: bool) -> ParseResult<Vec<Directive>> {
        let mut directives = Vec::new();
        while self.eat_punct('@') {
            let name = self.expect_name()?;
            self.arguments(constant)?;
            directives.push(Directive { name });
        }
        Ok(directives)
    }

    /// `(name: value, ...)`, checked and skipped.
    fn arguments(&mut self, constant: bool) -> ParseResult<()> {
        if self.eat_punct('(') {
            while !self.eat_punct(')') {
                self.expect_name()?;
                self.expect_punct(':')?;
                self.value(constant)?;
            }
        }
        Ok(())
    }

    fn directive_definition(&mut self) -> ParseResult<Definition> {
        self.expect_keyword("directive")?;
        self.expect_punct('@')?;
        let name = self.expect_name()?;
        self.argument_definitions()?;
        if self.at_name("repeatable") {
            self.advance();
        }
        self.expect_keyword("on")?;
        self.eat_punct('|');
        self.expect_name()?;
        while self.eat_punct('|') {
            self.expect_name()?;
        }
        Ok(Definition::Directive(name))
    }

    fn value(&mut self, constant: bool) -> ParseResult<Value> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected("a value"));
        };
        let value = match token.kind {
            TokenKind::Int => {
                self.advance();
                token
                    .value
                    .parse::<i64>()
                    .map(Value::from)
                    .or_else(|_| token.value.parse::<f64>().map(Value::from))
                    .map_err(|_| self.error_here(format!("invalid integer `{}`", token.value)))?
            }
            TokenKind::Float => {
                self.advance();
                let parsed = token
                    .value
                    .parse::<f64>()
                    .map_err(|_| self.error_here(format!("invalid float `{}`", token.value)))?;
                Number::from_f64(parsed).map_or(Value::Null, Value::Number)
            }
            TokenKind::String | TokenKind::BlockString => {
                self.advance();
                Value::String(token.value)
            }
            TokenKind::Name => {
                self.advance();
                match token.value.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    "null" => Value::Null,
                    _ => Value::String(token.value),
                }
            }
            TokenKind::Punct if token.is_punct('$') => {
                if constant {
                    return Err(self.error_here("variables are not allowed in constant values"));
                }
                self.advance();
                Value::String(format!("${}", self.expect_name()?))
            }
            TokenKind::Punct if token.is_punct('[') => {
                self.advance();
                let mut items = Vec::new();
                while !self.eat_punct(']') {
                    items.push(self.value(constant)?);
                }
                Value::Array(items)
            }
            TokenKind::Punct if token.is_punct('{') => {
                self.advance();
                let mut fields = Map::new();
                while !self.eat_punct('}') {
                    let name = self.expect_name()?;
                    self.expect_punct(':')?;
                    fields.insert(name, self.value(constant)?);
                }
                Value::Object(fields)
            }
            _ => return Err(self.unexpected("a value")),
        };
        Ok(value)
    }

    fn operation(&mut self, kind: Option<OperationKind>) -> ParseResult<OperationDefinition> {
        let start = self.peek().map_or(0, |t| t.start);
        let mut name = None;
        let mut variables = Vec::new();
        if kind.is_some() {
            self.advance();
            if self.peek_kind() == TokenKind::Name {
                name = Some(self.expect_name()?);
            }
            if self.eat_punct('(') {
                while !self.eat_punct(')') {
                    variables.push(self.variable_definition()?);
                }
            }
            self.directives(false)?;
        }
        let selections = self.selection_set()?;
        let end = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(start, |t| t.end);
        Ok(OperationDefinition {
            kind: kind.unwrap_or(OperationKind::Query),
            name,
            variables,
            selections,
            span: (start, end),
        })
    }

    fn variable_definition(&mut self) -> ParseResult<InputValueDefinition> {
        self.expect_punct('$')?;
        let name = self.expect_name()?;
        self.expect_punct(':')?;
        let ty = self.type_annotation()?;
        let default = if self.eat_punct('=') {
            Some(self.value(true)?)
        } else {
            None
        };
        let directives = self.directives(true)?;
        Ok(InputValueDefinition {
            name,
            description: None,
            ty,
            default,
            directives,
        })
    }

    fn fragment(&mut self) -> ParseResult<FragmentDefinition> {
        self.expect_keyword("fragment")?;
        let name = self.expect_name()?;
        self.expect_keyword("on")?;
        self.expect_name()?;
        self.directives(false)?;
        let selections = self.selection_set()?;
        Ok(FragmentDefinition { name, selections })
    }

    fn selection_set(&mut self) -> ParseResult<Vec<Selection>> {
        self.expect_punct('{')?;
        let mut selections = Vec::new();
        while !self.eat_punct('}') {
            selections.push(self.selection()?);
        }
        Ok(selections)
    }

    fn selection(&mut self) -> ParseResult<Selection> {
        if self.peek_kind() == TokenKind::Spread {
            self.advance();
            if self.at_name("on") {
                self.advance();
                self.expect_name()?;
                self.directives(false)?;
                return self.selection_set().map(Selection::InlineFragment);
            }
            if self.peek_kind() == TokenKind::Name {
                let name = self.expect_name()?;
                self.directives(false)?;
                return Ok(Selection::FragmentSpread(name));
            }
            self.directives(false)?;
            return self.selection_set().map(Selection::InlineFragment);
        }

        let first = self.expect_name()?;
        let (alias, name) = if self.eat_punct(':') {
            (Some(first), self.expect_name()?)
        } else {
            (None, first)
        };
        self.arguments(false)?;
        self.directives(false)?;
        if self.at_punct('{') {
            self.selection_set()?;
        }
        Ok(Selection::Field(FieldSelection { alias, name }))
    }
}

fn operation_kind(keyword: &str) -> Option<OperationKind> {
    match keyword {
        "query" => Some(OperationKind::Query),
        "mutation" => Some(OperationKind::Mutation),
        "subscription" => Some(OperationKind::Subscription),
        _ => None,
    }
}
