// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

use std::borrow::Cow;
use std::io::{Cursor, Write};
use quick_xml::escape::partial_escape;
use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::{Error, Result};

/// Путь до элемента в дереве: индексы в `children` начиная от корня.
/// Пустой путь это сам корень
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Текст хранится в экранированном виде как был в файле, чтобы при записи
    /// ничего не поменялось
    Text(String),
    /// Комментарии, CDATA, объявление xml, doctype и инструкции обработки
    /// просто переносятся в вывод как есть
    Other(Event<'static>),
}

impl Node {
    fn is_whitespace(&self) -> bool {
        matches!(self, Node::Text(text) if text.chars().all(char::is_whitespace))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Имя вместе с префиксом, например `android:name`
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn from_start(start: &BytesStart) -> Result<Self> {
        let mut element = Self::new(&String::from_utf8(start.name().as_ref().to_vec())?);

        for attr in start.attributes() {
            let attr = attr?;

            element.attributes.push(Attribute {
                name: String::from_utf8(attr.key.as_ref().to_vec())?,
                value: attr.unescape_value()?.into_owned(),
            });
        }

        Ok(element)
    }

    /// Атрибут по полному имени с префиксом, без учёта пространств имён
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value.to_string(),
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Дочерние элементы вместе с их индексами в `children`
    pub fn child_elements(&self) -> impl Iterator<Item = (usize, &Element)> {
        self.children.iter().enumerate().filter_map(|(i, node)| match node {
            Node::Element(element) => Some((i, element)),
            _ => None,
        })
    }

    /// Объявления `xmlns:prefix="uri"` на самом элементе
    fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|a| {
            a.name.strip_prefix("xmlns:").map(|prefix| (prefix, a.value.as_str()))
        })
    }

    /// Добавляет элемент последним ребёнком и возвращает его индекс в `children`.
    /// Если у соседей есть отступы, новый элемент получает такой же отступ,
    /// иначе в манифесте всё слипалось бы в одну строку. Если соседей нет,
    /// а перед закрывающим тегом стоит отступ, берётся он плюс один уровень
    pub fn append_child(&mut self, element: Element) -> usize {
        let trailing = match self.children.last() {
            Some(node @ Node::Text(text)) if node.is_whitespace() => Some(text.clone()),
            _ => None,
        };

        let sibling_indent = self.children.windows(2).rev().find_map(|pair| match pair {
            [Node::Text(text), Node::Element(_)] if pair[0].is_whitespace() => Some(text.clone()),
            _ => None,
        });

        let indent = sibling_indent.or_else(|| trailing.as_deref().map(nested_indent));

        match (trailing.is_some(), indent) {
            (true, Some(indent)) => {
                let at = self.children.len() - 1;
                self.children.insert(at, Node::Text(indent));
                self.children.insert(at + 1, Node::Element(element));
                at + 1
            }
            _ => {
                self.children.push(Node::Element(element));
                self.children.len() - 1
            }
        }
    }

    /// Удаляет дочерний элемент по индексу в `children` вместе с отступом перед ним.
    /// Если по индексу лежит не элемент, ничего не происходит
    pub fn remove_child_at(&mut self, index: usize) -> Option<Element> {
        if !matches!(self.children.get(index), Some(Node::Element(_))) {
            return None;
        }

        let removed = match self.children.remove(index) {
            Node::Element(element) => element,
            _ => return None,
        };

        if index > 0 && self.children[index - 1].is_whitespace() {
            self.children.remove(index - 1);
        }

        Some(removed)
    }
}

/// Отступ на уровень глубже чем `closing`. Единица отступа: табуляция если
/// файл ими отформатирован, иначе четыре пробела
fn nested_indent(closing: &str) -> String {
    let unit = if closing.ends_with('\t') { "\t" } else { "    " };

    if closing.contains('\n') {
        format!("{}{}", closing, unit)
    } else {
        format!("\n{}{}", closing, unit)
    }
}

/// Минимальный DOM поверх событий quick_xml. Его хватает для манифеста:
/// элементы, атрибуты, текст. Всё остальное хранится как сырые события
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    prolog: Vec<Node>,
    pub root: Element,
    epilog: Vec<Node>,
}

impl Document {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        let mut tree = TreeBuilder::default();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    tree.stack.push(Element::from_start(&e)?);
                }

                Event::Empty(e) => {
                    let element = Element::from_start(&e)?;
                    tree.attach(Node::Element(element))?;
                }

                Event::End(_) => {
                    // Несовпадающие закрывающие теги отлавливает сам reader
                    if let Some(element) = tree.stack.pop() {
                        tree.attach(Node::Element(element))?;
                    }
                }

                Event::Text(e) => {
                    let raw = String::from_utf8(e.into_inner().into_owned())?;
                    tree.attach(Node::Text(raw))?;
                }

                Event::Eof => break,

                other => tree.attach(Node::Other(other.into_owned()))?,
            }

            buf.clear();
        }

        tree.finish()
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }

        write_element(&mut writer, &self.root)?;

        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }

        let result = writer.into_inner().into_inner();
        Ok(String::from_utf8(result)?)
    }

    pub fn element(&self, path: &[usize]) -> Option<&Element> {
        let mut current = &self.root;

        for &index in path {
            current = match current.children.get(index) {
                Some(Node::Element(element)) => element,
                _ => return None,
            };
        }

        Some(current)
    }

    pub fn element_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = &mut self.root;

        for &index in path {
            current = match current.children.get_mut(index) {
                Some(Node::Element(element)) => element,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Удаляет элемент из родителя. Корень удалить нельзя
    pub fn remove_element(&mut self, path: &[usize]) -> Option<Element> {
        let (&index, parent_path) = path.split_last()?;
        self.element_mut(parent_path)?.remove_child_at(index)
    }

    /// Все объявления пространств имён от корня до элемента включительно,
    /// внешние раньше внутренних
    fn namespace_scope(&self, path: &[usize]) -> Vec<(String, String)> {
        let mut scope = Vec::new();
        let mut current = Some(&self.root);
        let mut rest = path.iter();

        while let Some(element) = current {
            scope.extend(element.namespace_declarations().map(|(p, u)| (p.to_string(), u.to_string())));

            current = rest.next().and_then(|&index| match element.children.get(index) {
                Some(Node::Element(child)) => Some(child),
                _ => None,
            });
        }

        scope
    }

    /// Префикс под которым `uri` виден на элементе. Внутренние объявления
    /// перекрывают внешние, в том числе если префикс переопределён на другой uri
    pub fn prefix_for(&self, path: &[usize], uri: &str) -> Option<String> {
        let scope = self.namespace_scope(path);
        let mut shadowed: Vec<&str> = Vec::new();

        for (prefix, bound) in scope.iter().rev() {
            if shadowed.contains(&prefix.as_str()) {
                continue;
            }

            if bound == uri {
                return Some(prefix.clone());
            }

            shadowed.push(prefix);
        }

        None
    }

    fn namespace_of(scope: &[(String, String)], prefix: &str) -> Option<String> {
        scope.iter().rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
    }

    /// Имя атрибута с локальным именем `local` из пространства `uri`. Атрибуты
    /// без префикса ни в каком пространстве имён не находятся
    fn find_attribute_ns(&self, path: &[usize], local: &str, uri: &str) -> Option<String> {
        let element = self.element(path)?;
        let scope = self.namespace_scope(path);

        element.attributes.iter()
            .filter_map(|a| a.name.split_once(':').map(|(prefix, name)| (a, prefix, name)))
            .filter(|(_, prefix, name)| *prefix != "xmlns" && *name == local)
            .find(|(_, prefix, _)| Self::namespace_of(&scope, prefix).as_deref() == Some(uri))
            .map(|(a, _, _)| a.name.clone())
    }

    pub fn attribute_ns(&self, path: &[usize], local: &str, uri: &str) -> Option<&str> {
        let name = self.find_attribute_ns(path, local, uri)?;
        self.element(path)?.attribute(&name)
    }

    /// Создаёт или перезаписывает атрибут в пространстве имён `uri`. Если
    /// в области видимости нет префикса для `uri`, на элементе объявляется
    /// `xmlns:{preferred_prefix}`
    pub fn set_attribute_ns(&mut self, path: &[usize], preferred_prefix: &str, local: &str, uri: &str, value: &str) {
        let name = match self.find_attribute_ns(path, local, uri) {
            Some(existing) => existing,
            None => match self.prefix_for(path, uri) {
                Some(prefix) => format!("{}:{}", prefix, local),
                None => {
                    if let Some(element) = self.element_mut(path) {
                        element.set_attribute(&format!("xmlns:{}", preferred_prefix), uri);
                    }

                    format!("{}:{}", preferred_prefix, local)
                }
            },
        };

        if let Some(element) = self.element_mut(path) {
            element.set_attribute(&name, value);
        }
    }
}

/// Состояние разбора: стек открытых элементов и то что лежит вокруг корня
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Element>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
}

impl TreeBuilder {
    fn attach(&mut self, node: Node) -> Result<()> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }

        match (node, self.root.is_some()) {
            (Node::Element(element), false) => self.root = Some(element),
            (Node::Element(element), true) => return Err(Error::MultipleRoots(element.name)),
            (other, false) => self.prolog.push(other),
            (other, true) => self.epilog.push(other),
        }

        Ok(())
    }

    fn finish(self) -> Result<Document> {
        if let Some(open) = self.stack.last() {
            return Err(Error::UnclosedElement(open.name.clone()));
        }

        let root = self.root.ok_or(Error::MissingRoot)?;

        Ok(Document {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<()> {
    match node {
        Node::Element(element) => write_element(writer, element)?,
        Node::Text(raw) => writer.write_event(Event::Text(BytesText::from_escaped(raw.as_str())))?,
        Node::Other(event) => writer.write_event(event.clone())?,
    }

    Ok(())
}

/// Значение атрибута для записи в двойных кавычках. Апостроф остаётся как
/// есть, а переводы строк и табуляция пишутся ссылками, иначе парсер на
/// следующем чтении нормализует их в пробелы
fn escape_attribute_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for ch in partial_escape(value).chars() {
        match ch {
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            other => escaped.push(other),
        }
    }

    escaped
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());

    for attr in &element.attributes {
        start.push_attribute(XmlAttribute {
            key: QName(attr.name.as_bytes()),
            value: Cow::Owned(escape_attribute_value(&attr.value).into_bytes()),
        });
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;

    for child in &element.children {
        write_node(writer, child)?;
    }

    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
