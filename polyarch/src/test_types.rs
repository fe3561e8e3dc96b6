use crate::{polymorphic, Pointee, PtrSlot, TaggedUnion, TypeTag};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub trait Activation: Pointee + Debug {
    fn apply(&self, x: f64) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypeTag)]
#[type_tag = "relu"]
pub struct Relu {
    pub leak: f64,
}

impl Activation for Relu {
    fn apply(&self, x: f64) -> f64 {
        if x > 0.0 {
            x
        } else {
            self.leak * x
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypeTag)]
#[type_tag = "sigmoid"]
pub struct Sigmoid {
    pub steepness: f64,
}

impl Activation for Sigmoid {
    fn apply(&self, x: f64) -> f64 {
        1.0 / (1.0 + (-self.steepness * x).exp())
    }
}

polymorphic!(dyn Activation { Relu, Sigmoid });

#[derive(Debug, TaggedUnion)]
pub enum Node {
    Activation(PtrSlot<dyn Activation>),
    Bias(f64),
    Name(String),
}

pub fn relu(leak: f64) -> Node {
    Node::Activation(PtrSlot::new(Box::new(Relu { leak })))
}

pub fn sigmoid(steepness: f64) -> Node {
    Node::Activation(PtrSlot::new(Box::new(Sigmoid { steepness })))
}

pub fn slot<A: Activation>(activation: A) -> PtrSlot<dyn Activation> {
    PtrSlot::new(Box::new(activation))
}
