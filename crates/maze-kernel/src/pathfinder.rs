//! Breadth-first shortest paths over a map snapshot.
//!
//! Unknown cells (absent from the snapshot) are never entered. Neighbors are
//! expanded up, right, down, left, which fixes the tie-break between paths
//! of equal length.

use std::collections::{HashMap, VecDeque};

use crate::cell::CellKind;
use crate::map::MapSnapshot;
use crate::position::Position;

/// Default traversability: Room and Door.
pub fn room_or_door(kind: CellKind) -> bool {
    kind.is_open()
}

/// Traversability for an agent without keys: Room only.
pub fn room_only(kind: CellKind) -> bool {
    kind == CellKind::Room
}

/// Shortest path from `start` to `goal` through Room and Door cells.
pub fn shortest_path(map: &MapSnapshot, start: Position, goal: Position) -> Vec<Position> {
    shortest_path_with(map, start, goal, room_or_door)
}

/// Shortest path from `start` to `goal`, inclusive at both ends.
///
/// Returns `[start]` when `start == goal` and an empty vector when `goal`
/// cannot be reached. The start cell itself is not checked against
/// `traversable`; the crawler is already standing on it.
pub fn shortest_path_with<F>(
    map: &MapSnapshot,
    start: Position,
    goal: Position,
    traversable: F,
) -> Vec<Position>
where
    F: Fn(CellKind) -> bool,
{
    if start == goal {
        return vec![start];
    }

    let mut queue = VecDeque::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();

    queue.push_back(start);
    came_from.insert(start, start);

    while let Some(current) = queue.pop_front() {
        for next in current.neighbors_4() {
            if came_from.contains_key(&next) {
                continue;
            }
            let Some(&kind) = map.get(&next) else {
                continue;
            };
            if !traversable(kind) {
                continue;
            }

            came_from.insert(next, current);
            if next == goal {
                return reconstruct(&came_from, start, goal);
            }
            queue.push_back(next);
        }
    }

    Vec::new()
}

fn reconstruct(
    came_from: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        current = came_from[&current];
        path.push(current);
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: i32, height: i32, kind: CellKind) -> MapSnapshot {
        (0..width)
            .flat_map(|x| (0..height).map(move |y| (Position::new(x, y), kind)))
            .collect()
    }

    #[test]
    fn test_shortest_path_around_center_wall() {
        let mut map = grid(3, 3, CellKind::Room);
        map.insert(Position::new(1, 1), CellKind::Wall);

        let path = shortest_path(&map, Position::new(0, 0), Position::new(2, 2));

        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), Some(&Position::new(0, 0)));
        assert_eq!(path.last(), Some(&Position::new(2, 2)));
        assert!(!path.contains(&Position::new(1, 1)));
    }

    #[test]
    fn test_ties_follow_neighbor_order() {
        // open 2x2: right-then-down wins over down-then-right
        let map = grid(2, 2, CellKind::Room);
        let path = shortest_path(&map, Position::new(0, 0), Position::new(1, 1));
        assert_eq!(
            path,
            vec![Position::new(0, 0), Position::new(1, 0), Position::new(1, 1)]
        );
    }

    #[test]
    fn test_start_equals_goal_is_single_cell() {
        let map = MapSnapshot::new();
        let p = Position::new(4, 4);
        assert_eq!(shortest_path(&map, p, p), vec![p]);
    }

    #[test]
    fn test_absent_goal_is_unreachable() {
        let map = grid(3, 1, CellKind::Room);
        let path = shortest_path(&map, Position::new(0, 0), Position::new(5, 0));
        assert!(path.is_empty());
    }

    #[test]
    fn test_walled_in_goal_is_unreachable() {
        let mut map = grid(3, 3, CellKind::Wall);
        map.insert(Position::new(0, 0), CellKind::Room);
        map.insert(Position::new(2, 2), CellKind::Room);
        let path = shortest_path(&map, Position::new(0, 0), Position::new(2, 2));
        assert_eq!(path.len(), 0);
    }

    #[test]
    fn test_unknown_cells_are_not_crossed() {
        // (1,0) missing: no path although both ends are rooms
        let mut map = MapSnapshot::new();
        map.insert(Position::new(0, 0), CellKind::Room);
        map.insert(Position::new(2, 0), CellKind::Room);
        assert!(shortest_path(&map, Position::new(0, 0), Position::new(2, 0)).is_empty());
    }

    #[test]
    fn test_custom_traversability_excludes_doors() {
        let mut map = grid(3, 1, CellKind::Room);
        map.insert(Position::new(1, 0), CellKind::Door);

        let with_doors = shortest_path(&map, Position::new(0, 0), Position::new(2, 0));
        assert_eq!(with_doors.len(), 3);

        let rooms = shortest_path_with(&map, Position::new(0, 0), Position::new(2, 0), room_only);
        assert!(rooms.is_empty());
    }
}
