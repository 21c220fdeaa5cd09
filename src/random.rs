//! Выбор случайных записей: равномерный одиночный и пакетный смещённый.

use rand::Rng;

use crate::{
    dict::Dict,
    types::{DictType, DictValue},
};

impl<T: DictType> Dict<T> {
    /// Случайная запись: равномерно выбирается непустой бакет (по обеим
    /// таблицам, если идёт миграция), затем равномерно — элемент его
    /// цепочки. `None` на пустом словаре.
    pub fn random_key(&mut self) -> Option<(&T::Key, &DictValue<T::Val>)> {
        if self.is_empty() {
            return None;
        }
        self.rehash_step();

        let mut rng = rand::thread_rng();
        let (ti, slot) = loop {
            if self.is_rehashing() {
                // Бакеты ht[0] до rehash_idx уже пусты — их не разыгрываем.
                let s0 = self.ht[0].size();
                let start = self.rehash_idx as usize;
                let h = rng.gen_range(start..s0 + self.ht[1].size());
                let (ti, slot) = if h >= s0 { (1, h - s0) } else { (0, h) };
                if self.ht[ti].buckets[slot].is_some() {
                    break (ti, slot);
                }
            } else {
                let slot = rng.gen_range(0..self.ht[0].size());
                if self.ht[0].buckets[slot].is_some() {
                    break (0, slot);
                }
            }
        };

        // Длину цепочки считаем заранее, потом добираем нужный элемент
        // повторным проходом.
        let len = self.ht[ti].chain_len(slot);
        let mut target = rng.gen_range(0..len);

        let mut cur = self.ht[ti].buckets[slot].as_deref();
        while target > 0 {
            cur = cur.and_then(|e| e.next.as_deref());
            target -= 1;
        }
        cur.map(|e| (&e.key, &e.val))
    }

    /// До `count` записей за линейный проход от случайного бакета с
    /// заворотом по обеим таблицам.
    ///
    /// Выборка смещённая: записи одного бакета попадают в результат
    /// вместе, равномерности по ключам нет. Годится для статистики и
    /// выборочных проверок, но не как честный сэмплер.
    pub fn random_keys(&mut self, count: usize) -> Vec<(&T::Key, &DictValue<T::Val>)> {
        let count = count.min(self.len());
        let mut out = Vec::with_capacity(count);
        if count == 0 {
            return out;
        }
        self.rehash_step();

        let mut rng = rand::thread_rng();
        let tables: usize = if self.is_rehashing() { 2 } else { 1 };
        let mut maxsizemask = self.ht[0].size_mask;
        if tables == 2 {
            maxsizemask = maxsizemask.max(self.ht[1].size_mask);
        }

        let mut i = rng.gen_range(0..=maxsizemask);
        let mut empty_run = 0usize;
        // Ограничение числа шагов не даёт зациклиться на разреженной
        // таблице, когда запрошено больше, чем реально достижимо.
        let mut steps = (count * 10).max(16);

        'outer: while out.len() < count && steps > 0 {
            steps -= 1;
            let mut found = false;

            for ti in 0..tables {
                // Индекс может выходить за пределы меньшей таблицы.
                if i >= self.ht[ti].size() {
                    continue;
                }
                let mut cur = self.ht[ti].buckets[i].as_deref();
                while let Some(e) = cur {
                    out.push((&e.key, &e.val));
                    found = true;
                    if out.len() == count {
                        break 'outer;
                    }
                    cur = e.next.as_deref();
                }
            }

            if found {
                empty_run = 0;
            } else {
                empty_run += 1;
                // Длинная пустая полоса: перепрыгиваем в случайное место.
                if empty_run > 5 && empty_run > count {
                    i = rng.gen_range(0..=maxsizemask);
                    empty_run = 0;
                    continue;
                }
            }
            i = (i + 1) & maxsizemask;
        }
        out
    }
}
