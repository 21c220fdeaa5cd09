//! Точка полиморфизма словаря: дескриптор типа и тегированное значение.
//!
//! `DictType` описывает, как словарь обращается с ключами и значениями:
//! хеширование, сравнение, необязательные копирование и уничтожение.
//! Контекст не передаётся отдельным параметром: реализация хранит всё
//! нужное в собственном состоянии и получает его через `&self`.

use std::{
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use siphasher::sip::SipHasher13;

/// Набор способностей, которые словарь требует от вызывающего кода.
///
/// Обязательны только `hash` и `key_eq`. Остальные имеют поведение
/// по умолчанию: дублирование — тождество (хранится то, что передал
/// вызывающий), уничтожение — обычный `drop`.
pub trait DictType {
    type Key;
    type Val;

    /// Хеш ключа с учётом затравки словаря.
    fn hash(&self, seed: u64, key: &Self::Key) -> u64;

    /// Сравнение ключей.
    fn key_eq(&self, a: &Self::Key, b: &Self::Key) -> bool;

    /// Необязательная копия ключа перед сохранением. `None` — хранить
    /// переданный ключ как есть.
    fn dup_key(&self, _key: &Self::Key) -> Option<Self::Key> {
        None
    }

    /// Необязательная копия значения перед сохранением.
    fn dup_val(&self, _val: &Self::Val) -> Option<Self::Val> {
        None
    }

    /// Уничтожение ключа, которым владел словарь.
    fn destroy_key(&self, key: Self::Key) {
        drop(key);
    }

    /// Уничтожение значения (вызывается только для `DictValue::Ptr`).
    fn destroy_val(&self, val: Self::Val) {
        drop(val);
    }
}

/// Готовый дескриптор: SipHash с затравкой, сравнение через `Eq`.
pub struct SipDictType<K, V> {
    _marker: PhantomData<fn(K, V)>,
}

impl<K, V> Default for SipDictType<K, V> {
    fn default() -> Self {
        SipDictType {
            _marker: PhantomData,
        }
    }
}

impl<K, V> DictType for SipDictType<K, V>
where
    K: Hash + Eq,
{
    type Key = K;
    type Val = V;

    fn hash(&self, seed: u64, key: &K) -> u64 {
        let mut h = SipHasher13::new_with_keys(seed, seed.rotate_left(32));
        key.hash(&mut h);
        h.finish()
    }

    fn key_eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Тегированное значение записи.
///
/// Малые целые живут прямо в записи, без коробки. Активное
/// представление всегда известно статически, и деструкторы значений
/// вызываются только для варианта `Ptr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictValue<V> {
    Ptr(V),
    SignedInt(i64),
    UnsignedInt(u64),
}

impl<V> DictValue<V> {
    #[inline]
    pub fn as_ptr(&self) -> Option<&V> {
        match self {
            DictValue::Ptr(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_ptr_mut(&mut self) -> Option<&mut V> {
        match self {
            DictValue::Ptr(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn into_ptr(self) -> Option<V> {
        match self {
            DictValue::Ptr(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_signed(&self) -> Option<i64> {
        match self {
            DictValue::SignedInt(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            DictValue::UnsignedInt(n) => Some(*n),
            _ => None,
        }
    }
}

impl<V> From<V> for DictValue<V> {
    fn from(v: V) -> Self {
        DictValue::Ptr(v)
    }
}
